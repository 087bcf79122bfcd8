//! Serves `Hello, World!` on port 8080 for every request.

use hello_core::{Error, Hello, Server, ServerConfig};
use std::process::ExitCode;
use tracing::{error, info, Level};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    match run(ServerConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed to start: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: ServerConfig) -> hello_core::Result<()> {
    info!("Starting HTTP server on port {}", config.port);
    info!("Server will be available at http://localhost:{}", config.port);

    let server = Server::bind(config, Hello)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(server.config().workers)
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    runtime.block_on(server.serve())
}
