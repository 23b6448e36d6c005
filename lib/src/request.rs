//! Assembles the HTTP request for a classified query.
//!
//! This is a pure transformation of the configuration, the query and the
//! negotiated `Accept` value; nothing here touches the network.

use crate::config::{Credentials, RequestConfig};
use crate::consts;
use crate::format::AcceptHeader;
use crate::options::{Method, PostEncoding};
use crate::query::Query;
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONNECTION, CONTENT_TYPE, USER_AGENT};
use reqwest::Url;

/// A fully built request, ready for the transport. Discarded after one round trip.
#[derive(Debug, Clone)]
pub struct NegotiatedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub credentials: Option<Credentials>,
}

impl NegotiatedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn accept(&self) -> Option<&str> {
        self.header(ACCEPT.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Decoded `(name, value)` pairs of the URL query string.
    pub fn url_params(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Decoded `(name, value)` pairs of a form-encoded body.
    pub fn form_params(&self) -> Vec<(String, String)> {
        match (&self.body, self.content_type()) {
            (Some(body), Some(consts::FORM_URLENCODED)) => url::form_urlencoded::parse(body.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            _ => vec![],
        }
    }
}

/// Builds the request for `query`. Updates go to the update endpoint when one
/// is configured and are always POSTed.
pub fn build_request(
    config: &RequestConfig,
    query: &Query,
    accept: AcceptHeader,
) -> Result<NegotiatedRequest> {
    let is_update = query.is_update();
    let endpoint = match (&config.update_endpoint, is_update) {
        (Some(update_endpoint), true) => update_endpoint,
        _ => &config.endpoint,
    };
    let mut url =
        Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL '{endpoint}'"))?;

    let method = if is_update && config.method == Method::Get {
        warn!("SPARQL updates cannot be sent with GET; using POST for {endpoint}");
        Method::Post
    } else {
        config.method
    };

    let (text_param, graph_param, named_graph_param) = if is_update {
        (
            consts::UPDATE_PARAM,
            consts::USING_GRAPH_PARAM,
            consts::USING_NAMED_GRAPH_PARAM,
        )
    } else {
        (
            consts::QUERY_PARAM,
            consts::DEFAULT_GRAPH_PARAM,
            consts::NAMED_GRAPH_PARAM,
        )
    };

    let mut params: Vec<(&str, &str)> = Vec::new();
    for graph in &config.default_graphs {
        params.push((graph_param, graph.as_str()));
    }
    for graph in &config.named_graphs {
        params.push((named_graph_param, graph.as_str()));
    }
    for (name, value) in &config.parameters {
        params.push((name.as_str(), value.as_str()));
    }

    let text = query.text();
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(accept.as_str()));

    let body = match (method, config.post_encoding) {
        (Method::Get, _) => {
            url.query_pairs_mut()
                .append_pair(text_param, &text)
                .extend_pairs(params.iter());
            None
        }
        (Method::Post, PostEncoding::UrlEncoded) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(consts::FORM_URLENCODED));
            let form = url::form_urlencoded::Serializer::new(String::new())
                .append_pair(text_param, &text)
                .extend_pairs(params.iter())
                .finish();
            Some(form)
        }
        (Method::Post, PostEncoding::Direct) => {
            let content_type = if is_update {
                consts::SPARQL_UPDATE
            } else {
                consts::SPARQL_QUERY
            };
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            if !params.is_empty() {
                url.query_pairs_mut().extend_pairs(params.iter());
            }
            Some(text)
        }
    };

    headers.insert(
        CONNECTION,
        HeaderValue::from_static(config.keep_alive_mode().header_value()),
    );
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .with_context(|| format!("Invalid User-Agent '{}'", config.user_agent))?,
    );

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| anyhow!("Invalid header name '{name}': {e}"))?;
        if name == ACCEPT || name == CONTENT_TYPE {
            warn!("Ignoring custom {name} header; it is set by content negotiation");
            continue;
        }
        let value = HeaderValue::from_str(value)
            .map_err(|e| anyhow!("Invalid value for header '{name}': {e}"))?;
        headers.append(name, value);
    }

    debug!("Built {method} request to {url} with Accept: {accept}");
    Ok(NegotiatedRequest {
        method,
        url,
        headers,
        body,
        credentials: config.credentials.clone(),
    })
}
