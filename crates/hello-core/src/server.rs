//! Native HTTP server implementation
//!
//! - Multi-threaded tokio runtime, one task per connection
//! - Single catch-all handler, no route table
//! - Per-connection read/write timeouts
//! - TCP_NODELAY for low latency

use crate::{Error, Handler, Request, Result, TimeoutIo};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    pub workers: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            backlog: 1024,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Resolve hostname and port into a socket address.
    ///
    /// The hostname must be an IPv4 or IPv6 literal.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.hostname
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, self.port))
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", self.hostname, e)))
    }
}

/// Create a listening TCP socket.
///
/// SO_REUSEADDR lets a restart bind over TIME_WAIT sockets. SO_REUSEPORT is
/// left off so a second process cannot listen on the same port.
fn create_listener(addr: &SocketAddr, backlog: i32) -> std::io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;
    socket.bind(&(*addr).into())?;
    socket.listen(backlog)?;

    // Required before handing the socket to tokio
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

/// Counts open connections
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicU64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection; it counts as open until the guard drops
    pub fn open(self: &Arc<Self>) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Get current open connection count
    #[inline]
    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Keeps one connection counted in its [`ConnectionTracker`]
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A bound listener and the handler every request goes to
pub struct Server<H> {
    listener: std::net::TcpListener,
    local_addr: SocketAddr,
    handler: Arc<H>,
    config: ServerConfig,
    connections: Arc<ConnectionTracker>,
}

impl<H: Handler> Server<H> {
    /// Bind the listening socket. Fails if the address is invalid or taken.
    pub fn bind(config: ServerConfig, handler: H) -> Result<Self> {
        let addr = config.socket_addr()?;
        let listener =
            create_listener(&addr, config.backlog).map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            handler: Arc::new(handler),
            config,
            connections: Arc::new(ConnectionTracker::new()),
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared open-connection counter
    pub fn connections(&self) -> Arc<ConnectionTracker> {
        Arc::clone(&self.connections)
    }

    /// Accept and serve connections. Only returns on a fatal error.
    ///
    /// Must run inside a tokio runtime.
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::from_std(self.listener)?;

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            let guard = self.connections.open();
            debug!(
                "New connection from {}. Total connections: {}",
                peer,
                self.connections.count()
            );

            if let Err(e) = stream.set_nodelay(true) {
                debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
            }

            let handler = Arc::clone(&self.handler);
            let connections = Arc::clone(&self.connections);
            let read_timeout = self.config.read_timeout;
            let write_timeout = self.config.write_timeout;

            tokio::spawn(async move {
                let io = TokioIo::new(TimeoutIo::new(stream, read_timeout, write_timeout));
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let handler = Arc::clone(&handler);
                    async move {
                        let request = Request::from_hyper(&req, peer);
                        let start = Instant::now();
                        let response = handler.handle(&request);
                        debug!(
                            "{} {} - {} - {}ms",
                            request.method,
                            request.path,
                            response.status.as_u16(),
                            start.elapsed().as_millis()
                        );
                        Ok::<_, Infallible>(response.into_hyper())
                    }
                });

                let mut builder = http1::Builder::new();
                builder
                    .timer(TokioTimer::new())
                    .header_read_timeout(read_timeout);

                if let Err(e) = builder.serve_connection(io, service).await {
                    debug!("Connection error from {}: {}", peer, e);
                }

                drop(guard);
                debug!(
                    "Connection from {} closed. Total connections: {}",
                    peer,
                    connections.count()
                );
            });
        }
    }
}
