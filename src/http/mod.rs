//! HTTP/1.1 protocol implementation.
//!
//! # Architecture
//!
//! - **`connection`**: Per-socket request/response state machine
//! - **`parser`**: Extracts one framed request from a byte buffer
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Buffer bytes until one full request parses
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Route and run the handler
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Connection: close → Closing
//! ```
//!
//! EOF, a read error, a read timeout or a malformed request while `Reading`
//! also lead to `Closing`; no response is sent in those cases.

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
