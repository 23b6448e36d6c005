// Error conditions surfaced by the query pipeline. All of them are wrapped in
// `anyhow::Error`; callers recover the concrete type with `downcast_ref`.

use std::fmt;

/// Longest body excerpt rendered by the `Display` impls below.
const BODY_EXCERPT_LEN: usize = 256;

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() <= BODY_EXCERPT_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{cut}...")
}

/// The query text was rejected locally, before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedQueryError {
    pub message: String,
}

impl MalformedQueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for MalformedQueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Malformed query: {}", self.message)
    }
}

impl std::error::Error for MalformedQueryError {}

/// The HTTP round trip failed: either no response arrived (`status` is `None`)
/// or the endpoint answered with a non-2xx status.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub url: String,
    pub status: Option<u16>,
    pub body: Vec<u8>,
    pub message: String,
    pub timed_out: bool,
}

impl TransportError {
    /// 400: the endpoint could not parse the query.
    pub fn is_bad_request(&self) -> bool {
        self.status == Some(400)
    }

    /// 406: the endpoint cannot produce any of the accepted formats.
    pub fn is_not_acceptable(&self) -> bool {
        self.status == Some(406)
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.status {
            Some(400) => write!(
                f,
                "HTTP 400 Bad Request from {}, probably the query is not well formed: {}",
                self.url,
                excerpt(&self.body)
            ),
            Some(406) => write!(
                f,
                "HTTP 406 Not Acceptable from {}, the requested format cannot be produced: {}",
                self.url,
                excerpt(&self.body)
            ),
            Some(status) => write!(
                f,
                "HTTP {} from {}: {}: {}",
                status,
                self.url,
                self.message,
                excerpt(&self.body)
            ),
            None if self.timed_out => write!(f, "Request to {} timed out: {}", self.url, self.message),
            None => write!(f, "Request to {} failed: {}", self.url, self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// A 2xx response whose body does not parse under its declared content type.
#[derive(Debug, Clone)]
pub struct DecodeError {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub message: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Failed to decode response with content type {}: {}",
            self.content_type.as_deref().unwrap_or("<none>"),
            self.message
        )
    }
}

impl std::error::Error for DecodeError {}
