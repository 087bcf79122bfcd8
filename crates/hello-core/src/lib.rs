//! hello-core: a catch-all HTTP server that greets every request
//!
//! Every request, whatever its method or path, is handed to a single
//! [`Handler`]. The stock handler, [`Hello`], logs the request and answers
//! `200 OK` with a fixed plain-text body.
//!
//! ## Modules
//! - `server` - listener, accept loop, per-connection timeouts
//! - `handler` - the handler trait and the greeting handler
//! - `io` - read/write timeout wrapper for connection streams

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod handler;
pub mod io;
pub mod request;
pub mod response;
pub mod server;

#[cfg(test)]
mod test_util;

// Re-exports
pub use error::{Error, Result};
pub use handler::{Handler, Hello, GREETING};
pub use io::TimeoutIo;
pub use request::Request;
pub use response::{Response, ResponseBuilder};
pub use server::{ConnectionGuard, ConnectionTracker, Server, ServerConfig};
