use std::net::TcpListener;
use std::process::Command;
use std::time::{Duration, Instant};

#[test]
fn exits_non_zero_when_port_is_taken() {
    // If something else already owns the port the binary fails the same way
    let _holder = TcpListener::bind("0.0.0.0:8080");

    let start = Instant::now();
    let output = Command::new(env!("CARGO_BIN_EXE_hello-server"))
        .output()
        .expect("failed to run hello-server");

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(start.elapsed() < Duration::from_secs(10));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Starting HTTP server on port 8080"), "{}", stderr);
    assert!(
        stderr.contains("Server will be available at http://localhost:8080"),
        "{}",
        stderr
    );
    assert!(stderr.contains("Server failed to start"), "{}", stderr);
}
