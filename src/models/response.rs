// Response snapshot model
// Author: kelexine (https://github.com/kelexine)

use crate::error::AgentError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a response relates to the application origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin, fully readable.
    Basic,
    /// Cross-origin, readable.
    Cors,
    /// Cross-origin `no-cors`; status, headers and body are withheld.
    Opaque,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
        }
    }
}

impl FromStr for ResponseType {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "cors" => Ok(Self::Cors),
            "opaque" => Ok(Self::Opaque),
            other => Err(AgentError::InvalidRequest(format!(
                "Unknown response type '{}'",
                other
            ))),
        }
    }
}

/// A full response snapshot: status, type, headers and body.
///
/// Cloning shares the body buffer, so the cached copy and the copy handed to
/// the requester are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    pub status: u16,
    pub response_type: ResponseType,
    /// Final URL after redirects, when known.
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl AgentResponse {
    pub fn new(status: u16, response_type: ResponseType) -> Self {
        Self {
            status,
            response_type,
            url: None,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Same-origin response with the given status and body.
    pub fn basic(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status, ResponseType::Basic).with_body(body)
    }

    /// Filtered cross-origin `no-cors` response.
    pub fn opaque() -> Self {
        Self::new(0, ResponseType::Opaque)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Exactly 200 and same-origin.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }
}
