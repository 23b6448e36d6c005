//! Performs one HTTP round trip for a [`NegotiatedRequest`].
//!
//! A [`Connection`] owns the underlying HTTP client. With keep-alive enabled the
//! client pools idle connections so sequential queries on the same handle share
//! one TCP connection; otherwise nothing is kept idle and every request carries
//! `Connection: close`.

use crate::config::RequestConfig;
use crate::consts;
use crate::errors::TransportError;
use crate::options::{KeepAlive, Method};
use crate::request::NegotiatedRequest;
use anyhow::{anyhow, Result};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::time::Duration;

/// An HTTP client plus its connection-reuse policy. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Connection {
    client: Client,
    keep_alive: KeepAlive,
    timeout: Duration,
}

impl Connection {
    pub fn open(keep_alive: KeepAlive, timeout: Duration) -> Result<Self> {
        // a followed redirect would drop a POSTed query; 3xx surfaces as an error
        let mut builder = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none());
        if keep_alive.is_reuse() {
            builder = builder.pool_idle_timeout(Duration::from_secs(90));
        } else {
            builder = builder.pool_max_idle_per_host(0);
        }
        let client = builder.build()?;
        debug!("Opened HTTP connection handle (keep-alive: {})", keep_alive.is_reuse());
        Ok(Self {
            client,
            keep_alive,
            timeout,
        })
    }

    pub fn from_config(config: &RequestConfig) -> Result<Self> {
        Self::open(config.keep_alive_mode(), config.timeout)
    }

    pub fn keep_alive(&self) -> KeepAlive {
        self.keep_alive
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Status, headers and body of a successful (2xx) response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: u16,
    url: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            url: String::new(),
            headers,
            body,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The declared `Content-Type`, parameters included.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

fn send_error(url: &str, err: reqwest::Error) -> anyhow::Error {
    anyhow!(TransportError {
        url: url.to_string(),
        status: None,
        body: vec![],
        message: err.to_string(),
        timed_out: err.is_timeout(),
    })
}

/// Sends `request` and returns the response if its status is 2xx. Any other
/// status, and any failure to get a response at all, is a [`TransportError`].
pub fn execute(connection: &Connection, request: &NegotiatedRequest) -> Result<RawResponse> {
    let url = request.url.to_string();
    let mut builder = match request.method {
        Method::Get => connection.client.get(request.url.clone()),
        Method::Post => connection.client.post(request.url.clone()),
    };
    builder = builder.headers(request.headers.clone());
    if let Some(credentials) = &request.credentials {
        builder = builder.basic_auth(&credentials.user, Some(&credentials.password));
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    info!(
        "{} {} (Accept: {})",
        request.method,
        url,
        request.accept().unwrap_or(consts::ANY)
    );
    let resp = builder.send().map_err(|e| send_error(&url, e))?;
    let status = resp.status();
    let final_url = resp.url().to_string();
    let headers = resp.headers().clone();
    let body = resp.bytes().map_err(|e| send_error(&url, e))?.to_vec();
    debug!(
        "{} from {} ({} bytes, content type {})",
        status,
        final_url,
        body.len(),
        headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<none>")
    );

    if !status.is_success() {
        return Err(anyhow!(TransportError {
            url: final_url,
            status: Some(status.as_u16()),
            body,
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            timed_out: false,
        }));
    }
    Ok(RawResponse::new(status.as_u16(), headers, body).with_url(final_url))
}
