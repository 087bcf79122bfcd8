//! Error types for hello-core

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for hello operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop the server from starting or running
#[derive(Debug, Error)]
pub enum Error {
    /// Hostname and port do not form a socket address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Listening socket could not be created, bound or put into listen mode
    #[error("Bind error on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Async runtime could not be built
    #[error("Runtime error: {0}")]
    Runtime(std::io::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
