//! Maps a requested return format to the `Accept` header actually sent.
//!
//! Formats form a closed enumeration. Each query type has a fixed set of
//! formats it may ask for, and each [`EndpointProfile`] decides which of those
//! it honours as an explicit media type. Every other combination, and every
//! request made with content negotiation only, falls back to `Accept: */*`
//! and lets the server choose its default serialization.

use crate::consts;
use crate::options::Negotiation;
use crate::query::QueryType;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The serialization a caller asks the endpoint for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReturnFormat {
    Xml,
    Json,
    Csv,
    Tsv,
    N3,
    Turtle,
    RdfXml,
    JsonLd,
    /// No preference; always negotiated.
    #[default]
    Unspecified,
    /// A format name this library does not know; kept for diagnostics.
    Unknown(String),
}

impl ReturnFormat {
    pub fn name(&self) -> &str {
        match self {
            ReturnFormat::Xml => "xml",
            ReturnFormat::Json => "json",
            ReturnFormat::Csv => "csv",
            ReturnFormat::Tsv => "tsv",
            ReturnFormat::N3 => "n3",
            ReturnFormat::Turtle => "turtle",
            ReturnFormat::RdfXml => "rdf+xml",
            ReturnFormat::JsonLd => "json-ld",
            ReturnFormat::Unspecified => "",
            ReturnFormat::Unknown(name) => name,
        }
    }

    /// The media type this format stands for when used with `query_type`, or
    /// `None` when the combination is not a legal request.
    pub fn media_type_for(&self, query_type: QueryType) -> Option<&'static str> {
        if query_type.returns_solutions() {
            match self {
                ReturnFormat::Xml => Some(consts::SPARQL_RESULTS_XML),
                ReturnFormat::Json => Some(consts::SPARQL_RESULTS_JSON),
                ReturnFormat::Csv => Some(consts::CSV),
                ReturnFormat::Tsv => Some(consts::TSV),
                _ => None,
            }
        } else if query_type.returns_graph() {
            match self {
                ReturnFormat::Xml | ReturnFormat::RdfXml => Some(consts::RDF_XML),
                ReturnFormat::N3 => Some(consts::N3),
                ReturnFormat::Turtle => Some(consts::TURTLE),
                ReturnFormat::JsonLd => Some(consts::JSON_LD),
                _ => None,
            }
        } else {
            None
        }
    }

    pub fn is_valid_for(&self, query_type: QueryType) -> bool {
        self.media_type_for(query_type).is_some()
    }
}

impl From<&str> for ReturnFormat {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "xml" => ReturnFormat::Xml,
            "json" => ReturnFormat::Json,
            "csv" => ReturnFormat::Csv,
            "tsv" => ReturnFormat::Tsv,
            "n3" => ReturnFormat::N3,
            "turtle" | "ttl" => ReturnFormat::Turtle,
            "rdf+xml" | "rdfxml" | "rdf" => ReturnFormat::RdfXml,
            "json-ld" | "jsonld" => ReturnFormat::JsonLd,
            "" => ReturnFormat::Unspecified,
            _ => ReturnFormat::Unknown(value.to_string()),
        }
    }
}

impl From<String> for ReturnFormat {
    fn from(value: String) -> Self {
        ReturnFormat::from(value.as_str())
    }
}

impl From<ReturnFormat> for String {
    fn from(value: ReturnFormat) -> Self {
        value.name().to_string()
    }
}

impl FromStr for ReturnFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ReturnFormat::from(s))
    }
}

impl fmt::Display for ReturnFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReturnFormat::Unspecified => write!(f, "<unspecified>"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// What a targeted endpoint is known to honour as an explicit media type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndpointProfile {
    /// Honours every format that is legal for the query type.
    #[default]
    Generic,
    /// Apache Jena Fuseki 1.x: results formats for SELECT/ASK, only RDF/XML
    /// for CONSTRUCT/DESCRIBE.
    Fuseki,
}

impl EndpointProfile {
    pub fn recognizes(self, query_type: QueryType, format: &ReturnFormat) -> bool {
        if !format.is_valid_for(query_type) {
            return false;
        }
        match self {
            EndpointProfile::Generic => true,
            EndpointProfile::Fuseki => {
                query_type.returns_solutions() || matches!(format, ReturnFormat::Xml)
            }
        }
    }
}

/// The value negotiated for the `Accept` request header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AcceptHeader {
    /// An explicit media type the endpoint is known to produce.
    Specific(&'static str),
    /// `*/*`: the server picks its default serialization.
    Any,
}

impl AcceptHeader {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptHeader::Specific(media_type) => media_type,
            AcceptHeader::Any => consts::ANY,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AcceptHeader::Any)
    }
}

impl fmt::Display for AcceptHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chooses the `Accept` header for a query. Never fails: anything without a
/// direct alias degrades to [`AcceptHeader::Any`].
pub fn negotiate(
    query_type: QueryType,
    format: &ReturnFormat,
    negotiation: Negotiation,
    profile: EndpointProfile,
) -> AcceptHeader {
    if negotiation.is_only_conneg() {
        debug!("Content negotiation only for {query_type}; sending {}", consts::ANY);
        return AcceptHeader::Any;
    }
    if matches!(format, ReturnFormat::Unspecified) {
        return AcceptHeader::Any;
    }
    match format.media_type_for(query_type) {
        Some(media_type) if profile.recognizes(query_type, format) => {
            debug!("Requesting {media_type} for {query_type} ({format})");
            AcceptHeader::Specific(media_type)
        }
        Some(_) => {
            debug!("{profile:?} endpoint has no alias for {format} with {query_type}; negotiating");
            AcceptHeader::Any
        }
        None => {
            warn!("Return format {format} is not supported for {query_type} queries; negotiating");
            AcceptHeader::Any
        }
    }
}
