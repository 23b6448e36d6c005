mod common;

use common::{RecordedRequest, StubResponse, StubServer};
use sparqlwrap::consts;
use sparqlwrap::{ContentKind, DecodedResult, EndpointProfile, RequestConfig, ReturnFormat, SparqlClient};

const SELECT: &str = "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\nSELECT ?s ?o WHERE { ?s foaf:name ?o } LIMIT 10";
const CONSTRUCT: &str = "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\nCONSTRUCT { ?s foaf:name ?o } WHERE { ?s foaf:name ?o } LIMIT 10";

/// Answers like an endpoint whose defaults are SPARQL JSON for results and
/// Turtle for graphs, honouring explicit media types it knows.
fn endpoint(request: &RecordedRequest) -> StubResponse {
    let accept = request.header("accept").unwrap_or("*/*").to_string();
    let is_graph = request
        .param("query")
        .map(|q| q.contains("CONSTRUCT") || q.contains("DESCRIBE"))
        .unwrap_or(false);
    match (accept.as_str(), is_graph) {
        (consts::SPARQL_RESULTS_XML, false) => {
            StubResponse::ok(consts::SPARQL_RESULTS_XML, common::XML_RESULTS)
        }
        (consts::CSV, false) => StubResponse::ok(consts::CSV, "s,o\r\nhttp://example.org/alice,Alice\r\n"),
        (consts::TSV, false) => StubResponse::ok(
            consts::TSV,
            "?s\t?o\n<http://example.org/alice>\t\"Alice\"\n",
        ),
        (_, false) => StubResponse::ok(consts::SPARQL_RESULTS_JSON, common::JSON_RESULTS),
        (consts::RDF_XML, true) => StubResponse::ok(consts::RDF_XML, common::RDF_XML_GRAPH),
        (consts::JSON_LD, true) => StubResponse::ok(consts::JSON_LD, common::JSON_LD_GRAPH),
        (_, true) => StubResponse::ok(consts::TURTLE, common::TURTLE_GRAPH),
    }
}

fn run(
    server: &StubServer,
    query: &str,
    format: ReturnFormat,
    only_conneg: bool,
    profile: EndpointProfile,
) -> (String, DecodedResult) {
    let config = RequestConfig::builder()
        .endpoint(server.url())
        .return_format(format)
        .only_conneg(only_conneg)
        .profile(profile)
        .build()
        .unwrap();
    let result = SparqlClient::new(config).unwrap().query(query).unwrap();
    let accept = server
        .last_request()
        .header("accept")
        .unwrap_or_default()
        .to_string();
    (accept, result)
}

#[test]
fn test_select_formats() {
    let server = StubServer::start(endpoint);
    let generic = EndpointProfile::Generic;

    let (accept, result) = run(&server, SELECT, ReturnFormat::Xml, false, generic);
    assert_eq!(accept, consts::SPARQL_RESULTS_XML);
    assert!(matches!(result, DecodedResult::Bindings(_)));

    let (accept, result) = run(&server, SELECT, ReturnFormat::Json, false, generic);
    assert_eq!(accept, consts::SPARQL_RESULTS_JSON);
    assert_eq!(result.as_bindings().map(|t| t.len()), Some(2));

    let (accept, result) = run(&server, SELECT, ReturnFormat::Csv, false, generic);
    assert_eq!(accept, consts::CSV);
    assert_eq!(result.as_opaque().map(|o| o.kind), Some(ContentKind::Csv));

    let (accept, result) = run(&server, SELECT, ReturnFormat::Tsv, false, generic);
    assert_eq!(accept, consts::TSV);
    assert_eq!(result.as_opaque().map(|o| o.kind), Some(ContentKind::Tsv));
}

#[test]
fn test_select_with_graph_format_falls_back() {
    let server = StubServer::start(endpoint);
    for format in [ReturnFormat::N3, ReturnFormat::Turtle, ReturnFormat::JsonLd] {
        for only_conneg in [false, true] {
            let (accept, result) = run(
                &server,
                SELECT,
                format.clone(),
                only_conneg,
                EndpointProfile::Generic,
            );
            assert_eq!(accept, "*/*", "{format} (only_conneg={only_conneg})");
            // the server's default wins
            assert!(result.as_bindings().is_some());
        }
    }
}

#[test]
fn test_only_conneg_never_sends_alias() {
    let server = StubServer::start(endpoint);
    let (accept, result) = run(&server, SELECT, ReturnFormat::Xml, true, EndpointProfile::Generic);
    assert_eq!(accept, "*/*");
    assert!(result.as_bindings().is_some());

    let (accept, result) = run(&server, CONSTRUCT, ReturnFormat::RdfXml, true, EndpointProfile::Generic);
    assert_eq!(accept, "*/*");
    assert_eq!(result.as_opaque().map(|o| o.kind), Some(ContentKind::Turtle));
}

#[test]
fn test_construct_formats_fuseki() {
    let server = StubServer::start(endpoint);
    let fuseki = EndpointProfile::Fuseki;

    let (accept, result) = run(&server, CONSTRUCT, ReturnFormat::Xml, false, fuseki);
    assert_eq!(accept, consts::RDF_XML);
    assert!(result.as_graph().is_some());

    for format in [
        ReturnFormat::RdfXml,
        ReturnFormat::N3,
        ReturnFormat::Turtle,
        ReturnFormat::JsonLd,
        ReturnFormat::Json,
        ReturnFormat::Csv,
        ReturnFormat::from("foo"),
    ] {
        let (accept, result) = run(&server, CONSTRUCT, format.clone(), false, fuseki);
        assert_eq!(accept, "*/*", "{format}");
        assert_eq!(
            result.as_opaque().map(|o| o.kind),
            Some(ContentKind::Turtle),
            "{format}"
        );
    }
}

#[test]
fn test_construct_formats_generic() {
    let server = StubServer::start(endpoint);
    let generic = EndpointProfile::Generic;

    let (accept, result) = run(&server, CONSTRUCT, ReturnFormat::JsonLd, false, generic);
    assert_eq!(accept, consts::JSON_LD);
    assert_eq!(result.as_graph().map(|g| g.len()), Some(2));

    let (accept, result) = run(&server, CONSTRUCT, ReturnFormat::Turtle, false, generic);
    assert_eq!(accept, consts::TURTLE);
    assert!(result.as_opaque().is_some());

    let (accept, _) = run(&server, CONSTRUCT, ReturnFormat::N3, false, generic);
    assert_eq!(accept, consts::N3);
}
