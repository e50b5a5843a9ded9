//! Wicket - a small concurrent HTTP/1.1 server
//!
//! Serves a fixed set of routes (root, echo, user-agent reflection, and file
//! retrieval/creation under a base directory) with keep-alive support.

pub mod config;
pub mod http;
pub mod routes;
pub mod server;
pub mod store;
