// crates/launchpad-fetch/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Local HTTP servers and manifest builders for fetch tests.
// Purpose: Exercise fetch adapters against real sockets without the network.
// Dependencies: launchpad-fetch, tiny_http
// ============================================================================

//! ## Overview
//! Each helper binds `127.0.0.1:0`, serves a fixed number of requests on a
//! background thread, and returns the base URL.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use launchpad_fetch::TransportPolicy;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// SHA-256 of the ASCII string "abc".
pub const ABC_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Policy permitting cleartext HTTP and local files for test endpoints.
pub fn test_policy() -> TransportPolicy {
    TransportPolicy {
        allow_http: true,
        allow_file: true,
        ..TransportPolicy::default()
    }
}

/// Builds a manifest document.
pub fn manifest_json(version: &str, payload_url: &str, digest: &str) -> String {
    format!(
        r#"{{"runtime_version":"{version}","payload_url":"{payload_url}","payload_sha256":"{digest}","published_at":"2026-03-01T12:00:00Z"}}"#
    )
}

// ============================================================================
// SECTION: Servers
// ============================================================================

/// Serves one request with `handler`; returns the base URL.
pub fn serve_once(
    handler: impl FnOnce(Request) + Send + 'static,
) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            handler(request);
        }
    });
    (format!("http://{addr}"), handle)
}

/// Serves up to `count` requests with `handler`; returns the base URL.
pub fn serve_many(
    count: usize,
    handler: impl Fn(Request) + Send + 'static,
) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        for _ in 0 .. count {
            match server.recv_timeout(Duration::from_secs(5)) {
                Ok(Some(request)) => handler(request),
                _ => break,
            }
        }
    });
    (format!("http://{addr}"), handle)
}

/// Serves one request with a fixed status and body.
pub fn serve_bytes(status: u16, body: Vec<u8>) -> (String, JoinHandle<()>) {
    serve_once(move |request| {
        let _ = request.respond(Response::from_data(body).with_status_code(status));
    })
}

// ============================================================================
// SECTION: Filesystem
// ============================================================================

/// Returns the entries of `dir`, or nothing when it does not exist.
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(Result::ok).map(|entry| entry.path()).collect(),
        Err(_) => Vec::new(),
    }
}
