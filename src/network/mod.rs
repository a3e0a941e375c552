//! Network fetch collaborator.
//!
//! The agent only talks to the network through the [`Network`] trait so the
//! lifecycle manager can be exercised without sockets. [`HttpNetwork`] is the
//! production implementation backed by `reqwest`.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod client;

pub use client::HttpNetwork;

use crate::error::Result;
use crate::models::{AgentRequest, AgentResponse};
use async_trait::async_trait;

/// Given a request descriptor, returns a response or fails.
///
/// Any HTTP status, including errors, is a successful fetch. Only transport
/// failures (DNS, refused connection, timeout, broken body) are errors.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &AgentRequest) -> Result<AgentResponse>;
}

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}
