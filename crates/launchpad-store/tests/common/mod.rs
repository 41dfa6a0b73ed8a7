// crates/launchpad-store/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Payload archive builders and store fixtures.
// Purpose: Produce real tar.gz payloads, including hostile ones, on disk.
// Dependencies: launchpad-store, tar, flate2, tempfile
// ============================================================================

//! ## Overview
//! Fixtures build archives with [`tar::Builder`]. Hostile entries are written
//! with raw header names because the builder refuses unsafe paths.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;
use launchpad_core::IntegrityVerifier;
use launchpad_core::RuntimeVersion;
use launchpad_core::Sha256Digest;
use launchpad_store::FsRuntimeStore;
use launchpad_store::StoreLayout;
use tar::Builder;
use tar::EntryType;
use tar::Header;
use tempfile::TempDir;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Entry point used by every fixture store.
pub const ENTRY_POINT: &str = "bin/runtime";

// ============================================================================
// SECTION: Archives
// ============================================================================

/// Archive entry description.
pub enum Entry<'a> {
    /// Directory entry.
    Dir(&'a str),
    /// Regular file entry with mode.
    File(&'a str, &'a [u8], u32),
    /// Regular file entry with a raw, unvalidated header name.
    RawFile(&'a [u8], &'a [u8]),
    /// Symbolic link entry.
    Symlink(&'a str, &'a str),
}

/// Writes a tar.gz archive containing `entries` to `path`.
pub fn write_archive(path: &Path, entries: &[Entry<'_>]) -> io::Result<()> {
    let encoder = GzEncoder::new(File::create(path)?, Compression::default());
    let mut builder = Builder::new(encoder);
    for entry in entries {
        let mut header = Header::new_gnu();
        match entry {
            Entry::Dir(name) => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder.append_data(&mut header, name, io::empty())?;
            }
            Entry::File(name, data, mode) => {
                header.set_entry_type(EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, name, *data)?;
            }
            Entry::RawFile(name, data) => {
                header.as_mut_bytes()[.. name.len()].copy_from_slice(name);
                header.set_entry_type(EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(data.len() as u64);
                header.set_cksum();
                builder.append(&header, *data)?;
            }
            Entry::Symlink(name, target) => {
                header.set_entry_type(EntryType::Symlink);
                header.set_mode(0o777);
                header.set_size(0);
                header.set_path(name)?;
                header.set_link_name(target)?;
                header.set_cksum();
                builder.append(&header, io::empty())?;
            }
        }
    }
    builder.into_inner()?.finish()?;
    Ok(())
}

/// Writes a well-formed runtime payload and returns its path and digest.
pub fn runtime_payload(dir: &Path, name: &str, marker: &str) -> (PathBuf, Sha256Digest) {
    let path = dir.join(name);
    write_archive(
        &path,
        &[
            Entry::Dir("bin"),
            Entry::File(ENTRY_POINT, b"#!/bin/sh\necho runtime\n", 0o755),
            Entry::File("share/version.txt", marker.as_bytes(), 0o644),
        ],
    )
    .unwrap();
    let digest = IntegrityVerifier::new().hash(&path).unwrap();
    (path, digest)
}

// ============================================================================
// SECTION: Store Fixtures
// ============================================================================

/// Temporary store root plus a payload directory outside of it.
pub struct StoreFixture {
    /// Root of every fixture path.
    pub temp: TempDir,
    /// Store layout under `temp/home`.
    pub layout: StoreLayout,
    /// Directory holding payload archives.
    pub payloads: PathBuf,
}

impl StoreFixture {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let layout = StoreLayout::new(temp.path().join("home"));
        let payloads = temp.path().join("payloads");
        fs::create_dir_all(&payloads).unwrap();
        Self {
            temp,
            layout,
            payloads,
        }
    }

    /// Returns a store over the fixture layout.
    pub fn store(&self) -> FsRuntimeStore {
        FsRuntimeStore::new(self.layout.clone(), ENTRY_POINT)
    }

    /// Writes a well-formed payload for `marker`.
    pub fn payload(&self, marker: &str) -> (PathBuf, Sha256Digest) {
        runtime_payload(&self.payloads, &format!("{marker}.tar.gz"), marker)
    }

    /// Lists the names of entries directly under `dir`.
    pub fn names(dir: &Path) -> Vec<String> {
        let mut names = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

/// Parses a version literal.
pub fn version(raw: &str) -> RuntimeVersion {
    RuntimeVersion::parse(raw).unwrap()
}
