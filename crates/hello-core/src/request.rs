//! HTTP Request types

use http::Method;
use std::net::SocketAddr;

/// The view of an incoming request a handler gets to see
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method, extension methods included
    pub method: Method,
    /// Address of the peer that sent the request
    pub remote_addr: SocketAddr,
    /// Request path (without query string)
    pub path: String,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, remote_addr: SocketAddr, path: impl Into<String>) -> Self {
        Self {
            method,
            remote_addr,
            path: path.into(),
        }
    }

    /// Build from a hyper request and the peer it arrived from
    pub fn from_hyper<B>(req: &hyper::Request<B>, remote_addr: SocketAddr) -> Self {
        Self::new(req.method().clone(), remote_addr, req.uri().path())
    }
}
