// crates/launchpad-core/tests/hashing.rs
// ============================================================================
// Module: Integrity Verifier Tests
// Description: Tests for streaming SHA-256 hashing and digest parsing.
// ============================================================================
//! ## Overview
//! Validates that streamed file digests match known vectors regardless of
//! chunk size, and that digest parsing normalizes and rejects input correctly.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use launchpad_core::DigestError;
use launchpad_core::IntegrityVerifier;
use launchpad_core::Sha256Digest;
use launchpad_core::core::hashing::hash_bytes;
use proptest::prelude::*;
use tempfile::tempdir;

/// SHA-256 of the ASCII string "abc".
const ABC_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

/// SHA-256 of the empty input.
const EMPTY_DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

// ============================================================================
// SECTION: Streaming Hash
// ============================================================================

/// Verifies file hashing matches the known "abc" vector.
#[test]
fn hash_matches_known_vector() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("abc.bin");
    fs::write(&path, b"abc").unwrap();

    let digest = IntegrityVerifier::new().hash(&path).unwrap();

    assert_eq!(digest.as_str(), ABC_DIGEST);
}

/// Verifies an empty file hashes to the empty digest.
#[test]
fn hash_of_empty_file_is_empty_digest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    fs::write(&path, b"").unwrap();

    let digest = IntegrityVerifier::new().hash(&path).unwrap();

    assert_eq!(digest.as_str(), EMPTY_DIGEST);
}

/// Verifies the digest does not depend on the chunk size.
#[test]
fn hash_is_independent_of_chunk_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("payload.bin");
    let payload: Vec<u8> = (0 .. 100_000_u32).map(|value| u8::try_from(value % 251).unwrap()).collect();
    fs::write(&path, &payload).unwrap();

    let small = IntegrityVerifier::with_chunk_size(7).hash(&path).unwrap();
    let large = IntegrityVerifier::new().hash(&path).unwrap();

    assert_eq!(small, large);
    assert_eq!(small, hash_bytes(&payload));
}

/// Verifies verify compares against the expected digest.
#[test]
fn verify_detects_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("abc.bin");
    fs::write(&path, b"abc").unwrap();
    let verifier = IntegrityVerifier::new();

    assert!(verifier.verify(&path, &Sha256Digest::parse(ABC_DIGEST).unwrap()).unwrap());
    assert!(!verifier.verify(&path, &Sha256Digest::parse(EMPTY_DIGEST).unwrap()).unwrap());
}

/// Verifies hashing a missing file reports an io error.
#[test]
fn hash_of_missing_file_fails() {
    let dir = tempdir().unwrap();

    assert!(IntegrityVerifier::new().hash(&dir.path().join("missing.bin")).is_err());
}

// ============================================================================
// SECTION: Digest Parsing
// ============================================================================

/// Verifies uppercase digests normalize to lowercase.
#[test]
fn digest_parse_normalizes_uppercase() {
    let digest = Sha256Digest::parse(&ABC_DIGEST.to_ascii_uppercase()).unwrap();

    assert_eq!(digest.as_str(), ABC_DIGEST);
}

/// Verifies short and non-hex digests are rejected.
#[test]
fn digest_parse_rejects_malformed_input() {
    assert_eq!(
        Sha256Digest::parse("abc"),
        Err(DigestError::Length {
            expected: 64,
            actual: 3,
        })
    );
    let non_hex = format!("{}g", &ABC_DIGEST[.. 63]);
    assert_eq!(Sha256Digest::parse(&non_hex), Err(DigestError::NonHex('g')));
}

/// Verifies digests deserialize through validation.
#[test]
fn digest_deserialize_validates() {
    let ok: Sha256Digest = serde_json::from_str(&format!("\"{ABC_DIGEST}\"")).unwrap();
    assert_eq!(ok.as_str(), ABC_DIGEST);
    assert!(serde_json::from_str::<Sha256Digest>("\"not-a-digest\"").is_err());
}

proptest! {
    #[test]
    fn digest_parse_never_panics(raw in ".{0,80}") {
        let _ = Sha256Digest::parse(&raw);
    }

    #[test]
    fn digest_parse_accepts_any_hex_of_length_64(raw in "[0-9a-fA-F]{64}") {
        let digest = Sha256Digest::parse(&raw).unwrap();
        prop_assert_eq!(digest.as_str(), raw.to_ascii_lowercase());
    }
}
