//! Shared option types that replace boolean flag parameters in the Rust API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method used to submit a query.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// How the query travels in a POST request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum PostEncoding {
    /// `application/x-www-form-urlencoded` body with a `query`/`update` field.
    #[default]
    UrlEncoded,
    /// The raw query as an `application/sparql-query` (or `-update`) body.
    Direct,
}

/// Whether an explicit format alias may be sent, or only the fallback `Accept`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Negotiation {
    /// Use the specific media type when the endpoint profile knows one.
    PreferAlias,
    /// Always send the fallback `Accept` and let the server choose.
    OnlyConneg,
}

impl Negotiation {
    pub fn is_only_conneg(self) -> bool {
        matches!(self, Negotiation::OnlyConneg)
    }
}

impl From<bool> for Negotiation {
    fn from(only_conneg: bool) -> Self {
        if only_conneg {
            Negotiation::OnlyConneg
        } else {
            Negotiation::PreferAlias
        }
    }
}

impl From<Negotiation> for bool {
    fn from(value: Negotiation) -> Self {
        value.is_only_conneg()
    }
}

/// Indicates whether sequential queries should share one connection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum KeepAlive {
    Reuse,
    #[default]
    Close,
}

impl KeepAlive {
    pub fn is_reuse(self) -> bool {
        matches!(self, KeepAlive::Reuse)
    }

    /// Value of the `Connection` request header.
    pub fn header_value(self) -> &'static str {
        match self {
            KeepAlive::Reuse => "keep-alive",
            KeepAlive::Close => "close",
        }
    }
}

impl From<bool> for KeepAlive {
    fn from(value: bool) -> Self {
        if value {
            KeepAlive::Reuse
        } else {
            KeepAlive::Close
        }
    }
}

impl From<KeepAlive> for bool {
    fn from(value: KeepAlive) -> Self {
        value.is_reuse()
    }
}
