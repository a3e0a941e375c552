// Intercepted request model and cache key derivation
// Author: kelexine (https://github.com/kelexine)

use crate::error::{AgentError, Result};
use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the requester intends to do with the response.
///
/// Mirrors the `Sec-Fetch-Dest` header values browsers send. Only
/// [`Destination::Document`] changes agent behavior (offline fallback);
/// nested browsing contexts are [`Destination::Iframe`] and never fall back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Iframe,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Audio,
    Video,
    Worker,
    #[default]
    Empty,
}

impl Destination {
    /// Parse a `Sec-Fetch-Dest` header value. Unknown values map to `Empty`.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "iframe" | "frame" => Self::Iframe,
            "image" => Self::Image,
            "script" => Self::Script,
            "style" => Self::Style,
            "font" => Self::Font,
            "manifest" => Self::Manifest,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "worker" | "sharedworker" | "serviceworker" => Self::Worker,
            _ => Self::Empty,
        }
    }
}

/// Request mode, used to classify cross-origin responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

impl RequestMode {
    /// Parse a `Sec-Fetch-Mode` header value. Unknown values map to `Cors`.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigate" | "nested-navigate" => Self::Navigate,
            "same-origin" => Self::SameOrigin,
            "no-cors" => Self::NoCors,
            _ => Self::Cors,
        }
    }
}

/// An outgoing resource fetch seen by the agent.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl AgentRequest {
    /// A plain GET with no headers or body.
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            destination: Destination::Empty,
            mode: RequestMode::Cors,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_destination(Destination::Document)
            .with_mode(RequestMode::Navigate)
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Cache key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }

    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }
}

/// Identity of a cached entry: upper-cased method plus absolute URL without
/// fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    method: String,
    url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
        }
    }

    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Only GET entries can live in a cache store.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Resolve a resource identifier (absolute URL or path) against the
/// application origin.
pub fn resolve_identifier(origin: &Url, identifier: &str) -> Result<Url> {
    origin.join(identifier).map_err(|e| {
        AgentError::InvalidRequest(format!("Cannot resolve '{}': {}", identifier, e))
    })
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
