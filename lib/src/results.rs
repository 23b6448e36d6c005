//! Decodes response bodies into typed results.
//!
//! Dispatch is on the `Content-Type` the endpoint actually returned, not on
//! what was requested, since negotiation may have fallen back to `*/*`.
//! SPARQL results documents and the RDF/XML and JSON-LD graph serializations
//! are parsed; every other body is handed back as tagged bytes.

use crate::consts;
use crate::errors::DecodeError;
use crate::query::QueryType;
use crate::transport::RawResponse;
use anyhow::{anyhow, Result};
use log::debug;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{Graph, Triple};
use oxigraph::sparql::results::{
    QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput,
};
use oxigraph::sparql::{QuerySolution, Variable};
use std::fmt;

/// The family a response `Content-Type` belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ContentKind {
    SparqlResultsXml,
    SparqlResultsJson,
    Csv,
    Tsv,
    RdfXml,
    JsonLd,
    Turtle,
    N3,
    NTriples,
    Unknown,
}

/// Media type without parameters, lowercased.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl ContentKind {
    /// Classifies a declared content type. Generic XML and JSON types depend
    /// on the query type: they are results documents unless a graph was asked for.
    pub fn classify(content_type: Option<&str>, query_type: QueryType) -> Self {
        let Some(content_type) = content_type else {
            return ContentKind::Unknown;
        };
        let media_type = essence(content_type);
        let media_type = media_type.as_str();
        let graph = query_type.returns_graph();
        match media_type {
            consts::SPARQL_RESULTS_XML => ContentKind::SparqlResultsXml,
            consts::SPARQL_RESULTS_JSON => ContentKind::SparqlResultsJson,
            consts::CSV => ContentKind::Csv,
            consts::TSV => ContentKind::Tsv,
            consts::RDF_XML => ContentKind::RdfXml,
            consts::JSON_LD => ContentKind::JsonLd,
            consts::N_TRIPLES => ContentKind::NTriples,
            m if consts::TURTLE_ALIASES.contains(&m) => ContentKind::Turtle,
            m if consts::N3_ALIASES.contains(&m) => ContentKind::N3,
            m if consts::XML_ALIASES.contains(&m) => {
                if graph {
                    ContentKind::RdfXml
                } else {
                    ContentKind::SparqlResultsXml
                }
            }
            m if consts::JSON_ALIASES.contains(&m) && !graph => ContentKind::SparqlResultsJson,
            _ => ContentKind::Unknown,
        }
    }

    /// Whether bodies of this kind are parsed rather than returned as bytes.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            ContentKind::SparqlResultsXml
                | ContentKind::SparqlResultsJson
                | ContentKind::RdfXml
                | ContentKind::JsonLd
        )
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ContentKind::SparqlResultsXml => "SPARQL XML results",
            ContentKind::SparqlResultsJson => "SPARQL JSON results",
            ContentKind::Csv => "CSV",
            ContentKind::Tsv => "TSV",
            ContentKind::RdfXml => "RDF/XML",
            ContentKind::JsonLd => "JSON-LD",
            ContentKind::Turtle => "Turtle",
            ContentKind::N3 => "N3",
            ContentKind::NTriples => "N-Triples",
            ContentKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Solutions of a SELECT query, in server order.
#[derive(Debug, PartialEq)]
pub struct BindingsTable {
    variables: Vec<Variable>,
    solutions: Vec<QuerySolution>,
}

impl BindingsTable {
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn solutions(&self) -> &[QuerySolution] {
        &self.solutions
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuerySolution> {
        self.solutions.iter()
    }
}

/// Triples of a CONSTRUCT or DESCRIBE result.
#[derive(Debug, Clone, PartialEq)]
pub struct RdfGraph {
    pub graph: Graph,
    pub content_type: Option<String>,
}

impl RdfGraph {
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

/// A body that is not parsed, with what is known about its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueBytes {
    pub content_type: Option<String>,
    pub kind: ContentKind,
    pub bytes: Vec<u8>,
}

impl OpaqueBytes {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

#[derive(Debug, PartialEq)]
pub enum DecodedResult {
    Bindings(BindingsTable),
    Boolean(bool),
    Graph(RdfGraph),
    Opaque(OpaqueBytes),
}

impl DecodedResult {
    pub fn as_bindings(&self) -> Option<&BindingsTable> {
        match self {
            DecodedResult::Bindings(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            DecodedResult::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&RdfGraph> {
        match self {
            DecodedResult::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueBytes> {
        match self {
            DecodedResult::Opaque(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            DecodedResult::Bindings(_) => "bindings",
            DecodedResult::Boolean(_) => "boolean",
            DecodedResult::Graph(_) => "graph",
            DecodedResult::Opaque(_) => "opaque",
        }
    }
}

fn decode_error(content_type: Option<String>, body: Vec<u8>, err: impl fmt::Display) -> anyhow::Error {
    anyhow!(DecodeError {
        content_type,
        body,
        message: err.to_string(),
    })
}

fn parse_results(body: &[u8], format: QueryResultsFormat) -> Result<DecodedResult> {
    match QueryResultsParser::from_format(format).for_reader(body)? {
        ReaderQueryResultsParserOutput::Boolean(value) => Ok(DecodedResult::Boolean(value)),
        ReaderQueryResultsParserOutput::Solutions(parser) => {
            let variables = parser.variables().to_vec();
            let mut solutions = Vec::new();
            for solution in parser {
                solutions.push(solution?);
            }
            Ok(DecodedResult::Bindings(BindingsTable {
                variables,
                solutions,
            }))
        }
    }
}

fn parse_graph(body: &[u8], format: RdfFormat, base_iri: &str) -> Result<Graph> {
    let parser = if base_iri.is_empty() {
        RdfParser::from_format(format)
    } else {
        RdfParser::from_format(format)
            .with_base_iri(base_iri)
            .unwrap_or_else(|_| RdfParser::from_format(format))
    };
    let mut graph = Graph::new();
    for quad in parser.for_reader(body) {
        let quad = quad?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(graph)
}

/// Decodes a 2xx response. A body of a parsed kind that fails to parse is a
/// [`DecodeError`] carrying the bytes; no partial result is returned.
pub fn decode(query_type: QueryType, response: RawResponse) -> Result<DecodedResult> {
    let content_type = response.content_type().map(str::to_string);
    let kind = ContentKind::classify(content_type.as_deref(), query_type);
    let base_iri = response.url().to_string();
    let body = response.into_body();

    let parsed = match kind {
        ContentKind::SparqlResultsXml => parse_results(&body, QueryResultsFormat::Xml),
        ContentKind::SparqlResultsJson => parse_results(&body, QueryResultsFormat::Json),
        ContentKind::RdfXml => parse_graph(&body, RdfFormat::RdfXml, &base_iri)
            .map(|graph| DecodedResult::Graph(RdfGraph {
                graph,
                content_type: content_type.clone(),
            })),
        ContentKind::JsonLd => match RdfFormat::from_media_type(consts::JSON_LD) {
            Some(format) => parse_graph(&body, format, &base_iri).map(|graph| {
                DecodedResult::Graph(RdfGraph {
                    graph,
                    content_type: content_type.clone(),
                })
            }),
            None => Err(anyhow!("JSON-LD parsing is not available")),
        },
        _ => {
            debug!(
                "Returning {} bytes of {kind} content for {query_type} unparsed",
                body.len()
            );
            return Ok(DecodedResult::Opaque(OpaqueBytes {
                content_type,
                kind,
                bytes: body,
            }));
        }
    };

    match parsed {
        Ok(result) => {
            debug!("Decoded {kind} response for {query_type} as {}", result.variant_name());
            Ok(result)
        }
        Err(err) => Err(decode_error(content_type, body, err)),
    }
}
