// crates/launchpad-cli/tests/common/mod.rs
// ============================================================================
// Module: Common CLI Test Fixtures
// Description: Config, manifest, and payload builders for binary tests.
// Purpose: Drive the launchpad binary against `file://` endpoints.
// Dependencies: flate2, launchpad-core, tar, tempfile, url
// ============================================================================

//! ## Overview
//! [`CliFixture`] lays out a temporary directory holding a config file, a
//! manifest, payload archives, and the install store root, then runs the
//! `launchpad` binary against it with a scrubbed environment.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use flate2::Compression;
use flate2::write::GzEncoder;
use launchpad_core::core::hashing::hash_bytes;
use tar::Builder;
use tar::EntryType;
use tar::Header;
use tempfile::TempDir;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Entry point configured for fixture installs.
pub const ENTRY_POINT: &str = "bin/runtime";

/// Environment variables the binary reads besides `--config`.
const SCRUBBED_ENV: [&str; 4] =
    ["LAUNCHPAD_CONFIG", "LAUNCHPAD_MANIFEST_URL", "LAUNCHPAD_PAYLOAD_URL", "LAUNCHPAD_HOME"];

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Temporary launcher environment.
pub struct CliFixture {
    /// Owns every fixture file.
    temp: TempDir,
}

impl CliFixture {
    /// Creates a fixture whose config points at a not-yet-published manifest.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("payloads")).expect("payload dir");
        let fixture = Self {
            temp,
        };
        let config = format!(
            r#"[endpoints]
manifest_url = "{manifest}"

[paths]
root = "{root}"

[runtime]
entry_point = "{ENTRY_POINT}"

[network]
allow_file = true

[retry]
manifest_attempts = 1
download_attempts = 1
backoff_ms = 0

[lock]
wait_ms = 0
"#,
            manifest = file_url(&fixture.manifest_path()),
            root = fixture.store_root().display(),
        );
        fs::write(fixture.config_path(), config).expect("write config");
        fixture
    }

    /// Returns the config file path.
    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("launchpad.toml")
    }

    /// Returns the manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.temp.path().join("manifest.json")
    }

    /// Returns the install store root.
    pub fn store_root(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    /// Builds a payload for `version` and publishes a manifest naming it.
    pub fn publish(&self, version: &str) {
        let archive = self.temp.path().join("payloads").join(format!("runtime-{version}.tar.gz"));
        write_runtime_archive(&archive, version);
        let digest = hash_bytes(&fs::read(&archive).expect("read archive"));
        let manifest = format!(
            r#"{{"runtime_version":"{version}","payload_url":"{url}","payload_sha256":"{digest}","published_at":"2026-03-01T12:00:00Z"}}"#,
            url = file_url(&archive),
        );
        fs::write(self.manifest_path(), manifest).expect("write manifest");
    }

    /// Removes the published manifest, simulating an outage.
    pub fn withdraw(&self) {
        fs::remove_file(self.manifest_path()).expect("remove manifest");
    }

    /// Runs the binary with `args` after `--config`.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_launchpad"));
        for key in SCRUBBED_ENV {
            command.env_remove(key);
        }
        command.arg("--config").arg(self.config_path()).args(args);
        command.output().expect("run launchpad")
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Parses each stdout line as JSON.
pub fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

/// Parses all of stdout as one JSON document.
pub fn json_document(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("json document")
}

/// Returns the `finished` progress line.
pub fn finished_line(output: &Output) -> serde_json::Value {
    json_lines(output)
        .into_iter()
        .find(|line| line["event"] == "finished")
        .expect("finished line")
}

/// Returns stderr as text.
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Converts a path to a `file://` URL.
fn file_url(path: &Path) -> String {
    Url::from_file_path(path).expect("absolute path").to_string()
}

/// Writes a gzip tarball holding an executable entry point script.
fn write_runtime_archive(path: &Path, version: &str) {
    let file = File::create(path).expect("create archive");
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    let mut dir = Header::new_gnu();
    dir.set_entry_type(EntryType::Directory);
    dir.set_mode(0o755);
    dir.set_size(0);
    builder.append_data(&mut dir, "bin", std::io::empty()).expect("append dir");

    let script = format!("#!/bin/sh\necho {version}\n");
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(0o755);
    header.set_size(script.len() as u64);
    builder.append_data(&mut header, ENTRY_POINT, script.as_bytes()).expect("append entry point");

    builder.into_inner().expect("finish tar").finish().expect("finish gzip");
}
