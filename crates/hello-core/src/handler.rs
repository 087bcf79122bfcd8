//! Request handlers
//!
//! The server has no route table: whatever [`Handler`] it is given receives
//! every request, for every path and every method.

use crate::{Request, Response};
use tracing::info;

/// Body sent by [`Hello`]
pub const GREETING: &str = "Hello, World!\n";

/// Produces the response for a request. Must not fail.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, req: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    fn handle(&self, req: &Request) -> Response {
        self(req)
    }
}

/// Logs the request and answers `200 OK` with [`GREETING`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Hello;

impl Handler for Hello {
    fn handle(&self, req: &Request) -> Response {
        info!(
            "Received {} request from {} for {}",
            req.method, req.remote_addr, req.path
        );

        Response::text(GREETING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::LogCapture;
    use http::{Method, StatusCode};
    use tracing::Level;

    fn request(method: &str, path: &str) -> Request {
        Request::new(
            Method::from_bytes(method.as_bytes()).unwrap(),
            "127.0.0.1:40000".parse().unwrap(),
            path,
        )
    }

    #[test]
    fn test_greeting_is_fourteen_bytes() {
        assert_eq!(GREETING.len(), 14);
    }

    #[test]
    fn test_hello_any_method_any_path() {
        let cases = [
            ("GET", "/"),
            ("POST", "/anything/at/all"),
            ("GET", "/favicon.ico"),
            ("DELETE", "/a/b/c"),
            ("PURGE", "/cache"),
        ];

        for (method, path) in cases {
            let res = Hello.handle(&request(method, path));
            assert_eq!(res.status, StatusCode::OK, "{method} {path}");
            assert_eq!(res.content_type(), Some("text/plain"));
            assert_eq!(&res.body[..], GREETING.as_bytes());
        }
    }

    #[test]
    fn test_hello_is_idempotent() {
        let req = request("GET", "/");
        let first = Hello.handle(&req);
        let second = Hello.handle(&req);
        assert_eq!(first.status, second.status);
        assert_eq!(first.headers, second.headers);
        assert_eq!(first.body, second.body);
    }

    #[test]
    fn test_hello_logs_request_line() {
        let capture = LogCapture::default();
        let res = tracing::subscriber::with_default(capture.subscriber(Level::INFO), || {
            Hello.handle(&request("PURGE", "/cache"))
        });

        assert_eq!(&res.body[..], GREETING.as_bytes());
        let logs = capture.contents();
        assert!(
            logs.contains("Received PURGE request from 127.0.0.1:40000 for /cache\n"),
            "{}",
            logs
        );
        assert!(logs.contains("INFO"), "{}", logs);
    }

    #[test]
    fn test_closure_handler() {
        let handler = |req: &Request| Response::text(req.path.clone());
        let res = handler.handle(&request("GET", "/echo"));
        assert_eq!(&res.body[..], b"/echo");
    }
}
