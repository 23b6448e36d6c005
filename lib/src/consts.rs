//! Media types and SPARQL 1.1 Protocol parameter names used when building
//! requests and classifying responses.

// sparql results
pub const SPARQL_RESULTS_XML: &str = "application/sparql-results+xml";
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
pub const CSV: &str = "text/csv";
pub const TSV: &str = "text/tab-separated-values";

// rdf serializations
pub const RDF_XML: &str = "application/rdf+xml";
pub const JSON_LD: &str = "application/ld+json";
pub const TURTLE: &str = "text/turtle";
pub const N3: &str = "text/n3";
pub const N_TRIPLES: &str = "application/n-triples";

// generic types some endpoints answer with
pub const XML: &str = "application/xml";
pub const TEXT_XML: &str = "text/xml";
pub const JSON: &str = "application/json";

pub const JSON_ALIASES: [&str; 3] = [JSON, "text/javascript", "application/javascript"];
pub const XML_ALIASES: [&str; 2] = [XML, TEXT_XML];
pub const TURTLE_ALIASES: [&str; 3] = [TURTLE, "application/turtle", "application/x-turtle"];
pub const N3_ALIASES: [&str; 3] = [N3, "text/rdf+n3", "application/n3"];

pub const ANY: &str = "*/*";

// request bodies
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const SPARQL_QUERY: &str = "application/sparql-query";
pub const SPARQL_UPDATE: &str = "application/sparql-update";

// protocol parameters
pub const QUERY_PARAM: &str = "query";
pub const UPDATE_PARAM: &str = "update";
pub const DEFAULT_GRAPH_PARAM: &str = "default-graph-uri";
pub const NAMED_GRAPH_PARAM: &str = "named-graph-uri";
pub const USING_GRAPH_PARAM: &str = "using-graph-uri";
pub const USING_NAMED_GRAPH_PARAM: &str = "using-named-graph-uri";
