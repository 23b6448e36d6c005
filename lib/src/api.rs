//! Caller-facing client: classify, negotiate, build, send, decode.

use crate::config::RequestConfig;
use crate::format::negotiate;
use crate::query::{classify, Query, QueryType};
use crate::request::{build_request, NegotiatedRequest};
use crate::results::{decode, DecodedResult};
use crate::transport::{execute, Connection, RawResponse};
use anyhow::Result;
use log::{debug, info};

/// Initializes logging for the sparqlwrap library.
///
/// If `SPARQLWRAP_LOG` is set, `RUST_LOG` is set to its value before
/// `env_logger` is installed. Calling this more than once is harmless.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("SPARQLWRAP_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
    let _ = env_logger::try_init();
}

/// A client bound to one endpoint configuration and one connection handle.
///
/// Queries issued through the same client run sequentially over its
/// [`Connection`]; when keep-alive is enabled they share a TCP connection.
/// Concurrent callers should each hold their own client.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    config: RequestConfig,
    connection: Connection,
}

impl SparqlClient {
    pub fn new(config: RequestConfig) -> Result<Self> {
        let connection = Connection::from_config(&config)?;
        Ok(Self { config, connection })
    }

    pub fn with_connection(config: RequestConfig, connection: Connection) -> Self {
        Self { config, connection }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Negotiates `Accept` and builds the request for an already classified query.
    pub fn request_for(&self, query: &Query) -> Result<NegotiatedRequest> {
        let accept = negotiate(
            query.query_type(),
            &self.config.return_format,
            self.config.negotiation(),
            self.config.profile,
        );
        build_request(&self.config, query, accept)
    }

    /// Everything up to the network call. Fails only on a malformed query or
    /// an unusable configuration.
    pub fn prepare(&self, text: &str) -> Result<NegotiatedRequest> {
        let query = classify(text)?;
        self.request_for(&query)
    }

    pub fn execute(&self, query: &Query) -> Result<QueryResponse> {
        let request = self.request_for(query)?;
        let raw = execute(&self.connection, &request)?;
        info!(
            "{} query answered with {} ({})",
            query.query_type(),
            raw.status(),
            raw.content_type().unwrap_or("no content type")
        );
        Ok(QueryResponse {
            query_type: query.query_type(),
            raw,
        })
    }

    /// Sends `text` and returns the undecoded response.
    pub fn query_response(&self, text: &str) -> Result<QueryResponse> {
        let query = classify(text)?;
        debug!("Classified query as {}", query.query_type());
        self.execute(&query)
    }

    /// Sends `text` and decodes the response by its returned content type.
    pub fn query(&self, text: &str) -> Result<DecodedResult> {
        self.query_response(text)?.convert()
    }
}

/// A successful response together with the type of the query that produced it.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    query_type: QueryType,
    raw: RawResponse,
}

impl QueryResponse {
    pub fn new(query_type: QueryType, raw: RawResponse) -> Self {
        Self { query_type, raw }
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn status(&self) -> u16 {
        self.raw.status()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.raw.content_type()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.header(name)
    }

    pub fn body(&self) -> &[u8] {
        self.raw.body()
    }

    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    pub fn convert(self) -> Result<DecodedResult> {
        decode(self.query_type, self.raw)
    }
}
