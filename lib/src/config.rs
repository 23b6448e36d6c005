//! Defines the per-endpoint request configuration consumed by the client.
//! Configurations are built with [`RequestConfig::builder`] and can be saved
//! to and loaded from JSON files.

use crate::format::{EndpointProfile, ReturnFormat};
use crate::options::{KeepAlive, Method, Negotiation, PostEncoding};
use anyhow::Result;
use derive_builder::Builder;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::Duration;

/// Already-resolved credentials, sent as HTTP Basic authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

fn default_user_agent() -> String {
    format!("sparqlwrap/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(
    pattern = "owned",
    setter(into),
    default,
    build_fn(validate = "Self::validate")
)]
#[serde(default)]
pub struct RequestConfig {
    /// SPARQL query endpoint URL.
    pub endpoint: String,
    /// Separate endpoint for updates; queries of type UPDATE go to `endpoint` when unset.
    #[builder(setter(into, strip_option))]
    pub update_endpoint: Option<String>,
    pub method: Method,
    pub post_encoding: PostEncoding,
    pub return_format: ReturnFormat,
    /// Only send the fallback `Accept` header, never an explicit format.
    pub only_conneg: bool,
    /// Reuse one connection for sequential queries.
    pub keep_alive: bool,
    /// Upper bound for a whole round trip.
    pub timeout: Duration,
    pub profile: EndpointProfile,
    pub user_agent: String,
    /// Extra HTTP headers, sent after the standard ones.
    pub headers: Vec<(String, String)>,
    /// Extra URL or form parameters, sent after the protocol parameters.
    pub parameters: Vec<(String, String)>,
    pub default_graphs: Vec<String>,
    pub named_graphs: Vec<String>,
    // never written back out
    #[serde(skip_serializing)]
    #[builder(setter(into, strip_option))]
    pub credentials: Option<Credentials>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            update_endpoint: None,
            method: Method::default(),
            post_encoding: PostEncoding::default(),
            return_format: ReturnFormat::default(),
            only_conneg: false,
            keep_alive: false,
            timeout: Duration::from_secs(30),
            profile: EndpointProfile::default(),
            user_agent: default_user_agent(),
            headers: vec![],
            parameters: vec![],
            default_graphs: vec![],
            named_graphs: vec![],
            credentials: None,
        }
    }
}

impl RequestConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let endpoint = match &self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint,
            _ => return Err("an endpoint URL is required".to_string()),
        };
        Url::parse(endpoint).map_err(|e| format!("invalid endpoint URL '{endpoint}': {e}"))?;
        if let Some(Some(update_endpoint)) = &self.update_endpoint {
            Url::parse(update_endpoint)
                .map_err(|e| format!("invalid update endpoint URL '{update_endpoint}': {e}"))?;
        }
        Ok(())
    }

    /// Appends one extra HTTP header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    /// Appends one extra URL or form parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn default_graph(mut self, iri: impl Into<String>) -> Self {
        self.default_graphs
            .get_or_insert_with(Vec::new)
            .push(iri.into());
        self
    }

    pub fn named_graph(mut self, iri: impl Into<String>) -> Self {
        self.named_graphs
            .get_or_insert_with(Vec::new)
            .push(iri.into());
        self
    }
}

impl RequestConfig {
    pub fn builder() -> RequestConfigBuilder {
        RequestConfigBuilder::default()
    }

    /// A configuration with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self::builder().endpoint(endpoint).build()?)
    }

    pub fn negotiation(&self) -> Negotiation {
        self.only_conneg.into()
    }

    pub fn keep_alive_mode(&self) -> KeepAlive {
        self.keep_alive.into()
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: RequestConfig = serde_json::from_reader(reader)?;
        Url::parse(&config.endpoint)?;
        if let Some(update_endpoint) = &config.update_endpoint {
            Url::parse(update_endpoint)?;
        }
        Ok(config)
    }
}

impl fmt::Display for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Request configuration:")?;
        writeln!(f, "  Endpoint: {}", self.endpoint)?;
        if let Some(update_endpoint) = &self.update_endpoint {
            writeln!(f, "  Update endpoint: {update_endpoint}")?;
        }
        writeln!(f, "  Method: {} ({:?})", self.method, self.post_encoding)?;
        writeln!(f, "  Return format: {}", self.return_format)?;
        writeln!(f, "  Only content negotiation: {}", self.only_conneg)?;
        writeln!(f, "  Keep-alive: {}", self.keep_alive)?;
        writeln!(f, "  Timeout: {:?}", self.timeout)?;
        writeln!(f, "  Profile: {:?}", self.profile)?;
        writeln!(f, "  User agent: {}", self.user_agent)?;
        for (name, value) in &self.headers {
            writeln!(f, "  Header: {name}: {value}")?;
        }
        for (name, value) in &self.parameters {
            writeln!(f, "  Parameter: {name}={value}")?;
        }
        for graph in &self.default_graphs {
            writeln!(f, "  Default graph: {graph}")?;
        }
        for graph in &self.named_graphs {
            writeln!(f, "  Named graph: {graph}")?;
        }
        write!(
            f,
            "  Credentials: {}",
            if self.credentials.is_some() { "set" } else { "none" }
        )
    }
}
