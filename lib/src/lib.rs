//! `sparqlwrap` issues SPARQL 1.1 Protocol queries and decodes their results.
//!
//! A query passes through a fixed pipeline: its text is classified
//! ([`query::classify`]), an `Accept` header is negotiated from the requested
//! [`format::ReturnFormat`] ([`format::negotiate`]), an HTTP request is built
//! ([`request::build_request`]), sent ([`transport::execute`]), and the
//! response is decoded by its returned content type ([`results::decode`]).
//! [`api::SparqlClient`] runs the whole pipeline.

extern crate derive_builder;

pub mod api;
pub mod config;
pub mod consts;
pub mod errors;
pub mod format;
pub mod options;
pub mod query;
pub mod request;
pub mod results;
pub mod transport;

pub use crate::api::{init_logging, QueryResponse, SparqlClient};
pub use crate::config::{Credentials, RequestConfig, RequestConfigBuilder};
pub use crate::errors::{DecodeError, MalformedQueryError, TransportError};
pub use crate::format::{AcceptHeader, EndpointProfile, ReturnFormat};
pub use crate::options::{KeepAlive, Method, Negotiation, PostEncoding};
pub use crate::query::{Query, QueryType};
pub use crate::results::{BindingsTable, ContentKind, DecodedResult, OpaqueBytes, RdfGraph};
