// offline-agent - Offline-first caching agent for a web application
// Author: kelexine (https://github.com/kelexine)

pub mod agent;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod network;
pub mod notify;
pub mod server;
pub mod utils;
