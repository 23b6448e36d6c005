//! Classifies SPARQL query text before it is sent.
//!
//! The prolog (`PREFIX`/`BASE` declarations) is parsed into an ordered list of
//! declarations with identical duplicates removed, and the first keyword after
//! it decides the [`QueryType`]. The remaining body is passed downstream
//! verbatim; the only inspection it receives is a scan for backslash escapes
//! outside of string literals, which are rejected rather than reinterpreted.

use crate::errors::MalformedQueryError;
use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref PREFIX_KEYWORD: Regex = Regex::new(r"^(?i:PREFIX)\b").unwrap();
    static ref PREFIX_DECL: Regex = Regex::new(
        r#"^(?i:PREFIX)\s*([^\s:<>]*):\s*<((?:[^<>"{}|^`\\\x00-\x20]|\\u[0-9A-Fa-f]{4}|\\U[0-9A-Fa-f]{8})*)>"#
    )
    .unwrap();
    static ref BASE_KEYWORD: Regex = Regex::new(r"^(?i:BASE)\b").unwrap();
    static ref BASE_DECL: Regex = Regex::new(
        r#"^(?i:BASE)\s*<((?:[^<>"{}|^`\\\x00-\x20]|\\u[0-9A-Fa-f]{4}|\\U[0-9A-Fa-f]{8})*)>"#
    )
    .unwrap();
    static ref KEYWORD: Regex = Regex::new(r"^[A-Za-z]+").unwrap();
}

/// The kind of operation a query text performs, decided by its first keyword.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Ask,
    Construct,
    Describe,
    Update,
    Unknown,
}

impl QueryType {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" => QueryType::Select,
            "ASK" => QueryType::Ask,
            "CONSTRUCT" => QueryType::Construct,
            "DESCRIBE" => QueryType::Describe,
            "INSERT" | "DELETE" | "LOAD" | "CLEAR" | "CREATE" | "DROP" | "COPY" | "MOVE"
            | "ADD" | "WITH" => QueryType::Update,
            _ => QueryType::Unknown,
        }
    }

    /// SELECT and ASK answer with a SPARQL results document.
    pub fn returns_solutions(self) -> bool {
        matches!(self, QueryType::Select | QueryType::Ask)
    }

    /// CONSTRUCT and DESCRIBE answer with an RDF graph.
    pub fn returns_graph(self) -> bool {
        matches!(self, QueryType::Construct | QueryType::Describe)
    }

    pub fn is_update(self) -> bool {
        matches!(self, QueryType::Update)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            QueryType::Select => "SELECT",
            QueryType::Ask => "ASK",
            QueryType::Construct => "CONSTRUCT",
            QueryType::Describe => "DESCRIBE",
            QueryType::Update => "UPDATE",
            QueryType::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

/// One declaration from the query prolog, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrologDecl {
    Base(String),
    Prefix { name: String, iri: String },
}

impl fmt::Display for PrologDecl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrologDecl::Base(iri) => write!(f, "BASE <{iri}>"),
            PrologDecl::Prefix { name, iri } => write!(f, "PREFIX {name}: <{iri}>"),
        }
    }
}

/// A classified query. Immutable once built; two texts that differ only by
/// repeated identical `PREFIX` lines classify to equal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    declarations: Vec<PrologDecl>,
    body: String,
    query_type: QueryType,
}

impl Query {
    pub fn parse(text: &str) -> Result<Self> {
        classify(text)
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn declarations(&self) -> &[PrologDecl] {
        &self.declarations
    }

    /// `(name, iri)` pairs of the prolog's prefix declarations.
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations.iter().filter_map(|d| match d {
            PrologDecl::Prefix { name, iri } => Some((name.as_str(), iri.as_str())),
            PrologDecl::Base(_) => None,
        })
    }

    /// The base IRI in effect after the prolog, if any.
    pub fn base(&self) -> Option<&str> {
        self.declarations.iter().rev().find_map(|d| match d {
            PrologDecl::Base(iri) => Some(iri.as_str()),
            PrologDecl::Prefix { .. } => None,
        })
    }

    /// The normalized prolog, one declaration per line.
    pub fn prolog(&self) -> String {
        self.declarations
            .iter()
            .map(|d| format!("{d}\n"))
            .collect()
    }

    /// Everything from the first keyword onwards, as written by the caller.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The text sent to the endpoint.
    pub fn text(&self) -> String {
        format!("{}{}", self.prolog(), self.body)
    }

    pub fn is_update(&self) -> bool {
        self.query_type.is_update()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl FromStr for Query {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        classify(s)
    }
}

fn malformed(message: String) -> anyhow::Error {
    anyhow!(MalformedQueryError::new(message))
}

fn snippet(text: &str) -> &str {
    let line = text.lines().next().unwrap_or("");
    match line.char_indices().nth(40) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// Skips whitespace and `#` comments starting at `pos`.
fn skip_trivia(text: &str, mut pos: usize) -> usize {
    loop {
        let rest = &text[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        if !trimmed.starts_with('#') {
            return pos;
        }
        pos += trimmed.find('\n').unwrap_or(trimmed.len());
    }
}

/// Parses the prolog, rejects conflicting prefix bindings and ambiguous
/// escapes, and determines the query type from the first keyword.
pub fn classify(text: &str) -> Result<Query> {
    let mut declarations = Vec::new();
    let mut bound: HashMap<String, String> = HashMap::new();
    let mut pos = skip_trivia(text, 0);

    loop {
        let rest = &text[pos..];
        if PREFIX_KEYWORD.is_match(rest) {
            let caps = PREFIX_DECL.captures(rest).ok_or_else(|| {
                malformed(format!("invalid PREFIX declaration near '{}'", snippet(rest)))
            })?;
            let name = caps[1].to_string();
            let iri = caps[2].to_string();
            pos += caps[0].len();
            match bound.get(&name) {
                Some(existing) if *existing == iri => {
                    debug!("Dropping duplicate declaration PREFIX {name}: <{iri}>");
                }
                Some(existing) => {
                    return Err(malformed(format!(
                        "prefix '{name}:' is bound to both <{existing}> and <{iri}>"
                    )));
                }
                None => {
                    bound.insert(name.clone(), iri.clone());
                    declarations.push(PrologDecl::Prefix { name, iri });
                }
            }
        } else if BASE_KEYWORD.is_match(rest) {
            let caps = BASE_DECL.captures(rest).ok_or_else(|| {
                malformed(format!("invalid BASE declaration near '{}'", snippet(rest)))
            })?;
            declarations.push(PrologDecl::Base(caps[1].to_string()));
            pos += caps[0].len();
        } else {
            break;
        }
        pos = skip_trivia(text, pos);
    }

    let body = &text[pos..];
    check_escapes(body)?;

    let query_type = KEYWORD
        .find(body)
        .map(|m| QueryType::from_keyword(m.as_str()))
        .unwrap_or(QueryType::Unknown);
    debug!(
        "Classified query as {query_type} with {} prolog declarations",
        declarations.len()
    );

    Ok(Query {
        declarations,
        body: body.to_string(),
        query_type,
    })
}

/// Walks the body outside of comments and string literals. Backslashes are
/// only legal there as `\u`/`\U` escapes inside an IRIREF; an escape in a
/// prefixed name such as `ex:a\,b` is rejected.
fn check_escapes(body: &str) -> Result<()> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                i = bytes[i..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map(|p| i + p)
                    .unwrap_or(bytes.len());
            }
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'<' => match iriref_end(bytes, i) {
                Some(end) => {
                    check_iri_escapes(&body[i + 1..end])?;
                    i = end + 1;
                }
                None => i += 1,
            },
            b'\\' => {
                let escaped = body[i + 1..].chars().next().unwrap_or(' ');
                return Err(malformed(format!(
                    "escaped character '\\{escaped}' in a prefixed name near '{}'",
                    snippet(&body[i..])
                )));
            }
            _ => i += 1,
        }
    }
    Ok(())
}

/// Returns the index just past the string literal opening at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let long = bytes.len() > start + 2 && bytes[start + 1] == quote && bytes[start + 2] == quote;
    let mut j = if long { start + 3 } else { start + 1 };
    while j < bytes.len() {
        let b = bytes[j];
        if b == b'\\' {
            j += 2;
        } else if long {
            if b == quote && j + 2 < bytes.len() && bytes[j + 1] == quote && bytes[j + 2] == quote {
                return j + 3;
            }
            j += 1;
        } else if b == quote {
            return j + 1;
        } else if b == b'\n' {
            return j;
        } else {
            j += 1;
        }
    }
    bytes.len()
}

/// Finds the closing `>` of an IRIREF opening at `start`, or `None` when the
/// `<` is a comparison operator.
fn iriref_end(bytes: &[u8], start: usize) -> Option<usize> {
    for (offset, b) in bytes[start + 1..].iter().enumerate() {
        match b {
            b'>' => return Some(start + 1 + offset),
            b' ' | b'\t' | b'\n' | b'\r' | b'<' | b'"' | b'{' | b'}' | b'|' | b'^' | b'`' => {
                return None
            }
            _ => {}
        }
    }
    None
}

fn check_iri_escapes(iri: &str) -> Result<()> {
    let bytes = iri.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let digits = match bytes.get(i + 1) {
            Some(b'u') => 4,
            Some(b'U') => 8,
            _ => {
                return Err(malformed(format!("invalid escape in IRI <{iri}>")));
            }
        };
        let hex = bytes.get(i + 2..i + 2 + digits);
        if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
            return Err(malformed(format!("invalid escape in IRI <{iri}>")));
        }
        i += 2 + digits;
    }
    Ok(())
}
