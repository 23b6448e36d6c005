#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// A request as seen by the stub endpoint.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }

    pub fn query_params(&self) -> Vec<(String, String)> {
        match self.target.split_once('?') {
            Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => vec![],
        }
    }

    pub fn form_params(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.query_params()
            .into_iter()
            .chain(self.form_params())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub delay: Option<std::time::Duration>,
    pub location: Option<String>,
}

impl StubResponse {
    pub fn ok(content_type: &str, body: &str) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.as_bytes().to_vec(),
            delay: None,
            location: None,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            body: body.as_bytes().to_vec(),
            delay: None,
            location: None,
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            content_type: None,
            body: vec![],
            delay: None,
            location: Some(location.to_string()),
        }
    }

    pub fn delayed(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync;

/// An HTTP/1.1 endpoint on a loopback port that answers through a closure,
/// records every request and counts accepted TCP connections.
pub struct StubServer {
    port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    connections: Arc<AtomicUsize>,
}

impl StubServer {
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let responder: Arc<Responder> = Arc::new(responder);

        let thread_requests = requests.clone();
        let thread_connections = connections.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                thread_connections.fetch_add(1, Ordering::SeqCst);
                let requests = thread_requests.clone();
                let responder = responder.clone();
                thread::spawn(move || serve_connection(stream, requests, responder));
            }
        });

        Self {
            port,
            requests,
            connections,
        }
    }

    /// Answers every request with the same response.
    pub fn always(response: StubResponse) -> Self {
        Self::start(move |_| response.clone())
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/sparql", self.port)
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request received")
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<RecordedRequest> {
    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 {
            return None;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        target,
        headers,
        body,
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        406 => "Not Acceptable",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn serve_connection(
    stream: TcpStream,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responder: Arc<Responder>,
) {
    let Ok(mut writer) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(stream);
    while let Some(request) = read_request(&mut reader) {
        let close = request
            .header("connection")
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false);
        requests.lock().unwrap().push(request.clone());
        let response = responder(&request);
        if let Some(delay) = response.delay {
            thread::sleep(delay);
        }

        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: {}\r\n",
            response.status,
            reason(response.status),
            response.body.len(),
            if close { "close" } else { "keep-alive" }
        );
        if let Some(content_type) = &response.content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        if let Some(location) = &response.location {
            head.push_str(&format!("Location: {location}\r\n"));
        }
        head.push_str("\r\n");
        if writer.write_all(head.as_bytes()).is_err()
            || writer.write_all(&response.body).is_err()
            || writer.flush().is_err()
        {
            return;
        }
        if close {
            return;
        }
    }
}

pub const XML_RESULTS: &str = r#"<?xml version="1.0"?>
<sparql xmlns="http://www.w3.org/2005/sparql-results#">
  <head>
    <variable name="s"/>
    <variable name="p"/>
    <variable name="o"/>
  </head>
  <results>
    <result>
      <binding name="s"><uri>http://example.org/alice</uri></binding>
      <binding name="p"><uri>http://xmlns.com/foaf/0.1/name</uri></binding>
      <binding name="o"><literal xml:lang="en">Alice</literal></binding>
    </result>
    <result>
      <binding name="s"><uri>http://example.org/alice</uri></binding>
      <binding name="p"><uri>http://xmlns.com/foaf/0.1/knows</uri></binding>
      <binding name="o"><uri>http://example.org/bob</uri></binding>
    </result>
    <result>
      <binding name="s"><bnode>b0</bnode></binding>
      <binding name="p"><uri>http://xmlns.com/foaf/0.1/age</uri></binding>
      <binding name="o"><literal datatype="http://www.w3.org/2001/XMLSchema#integer">42</literal></binding>
    </result>
  </results>
</sparql>"#;

pub const JSON_RESULTS: &str = r#"{
  "head": { "vars": ["s", "o"] },
  "results": {
    "bindings": [
      { "s": { "type": "uri", "value": "http://example.org/alice" },
        "o": { "type": "literal", "value": "Alice" } },
      { "s": { "type": "uri", "value": "http://example.org/bob" },
        "o": { "type": "literal", "value": "Bob" } }
    ]
  }
}"#;

pub const JSON_ASK: &str = r#"{ "head": {}, "boolean": true }"#;

pub const XML_ASK: &str = r#"<?xml version="1.0"?>
<sparql xmlns="http://www.w3.org/2005/sparql-results#">
  <head/>
  <boolean>false</boolean>
</sparql>"#;

pub const RDF_XML_GRAPH: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:foaf="http://xmlns.com/foaf/0.1/">
  <rdf:Description rdf:about="http://example.org/alice">
    <foaf:name>Alice</foaf:name>
    <foaf:knows rdf:resource="http://example.org/bob"/>
  </rdf:Description>
  <rdf:Description rdf:about="http://example.org/bob">
    <foaf:name>Bob</foaf:name>
  </rdf:Description>
</rdf:RDF>"#;

pub const JSON_LD_GRAPH: &str = r#"[
  {
    "@id": "http://example.org/alice",
    "http://xmlns.com/foaf/0.1/name": [{ "@value": "Alice" }],
    "http://xmlns.com/foaf/0.1/knows": [{ "@id": "http://example.org/bob" }]
  }
]"#;

pub const TURTLE_GRAPH: &str = "@prefix foaf: <http://xmlns.com/foaf/0.1/> .\n<http://example.org/alice> foaf:name \"Alice\" .\n";
