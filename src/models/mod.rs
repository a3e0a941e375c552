//! Data model shared by the cache, network and agent layers.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod request;
pub mod response;

pub use request::{resolve_identifier, same_origin, AgentRequest, Destination, RequestKey, RequestMode};
pub use response::{AgentResponse, ResponseType};
