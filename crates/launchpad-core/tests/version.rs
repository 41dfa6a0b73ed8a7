// crates/launchpad-core/tests/version.rs
// ============================================================================
// Module: Runtime Version Tests
// Description: Tests for runtime version label validation.
// ============================================================================
//! ## Overview
//! Version labels are embedded in install directory names, so validation must
//! reject separators and traversal tokens.

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

use launchpad_core::RuntimeVersion;
use launchpad_core::VersionError;
use launchpad_core::core::version::MAX_VERSION_LENGTH;
use proptest::prelude::*;

/// Verifies common version shapes are accepted.
#[test]
fn accepts_semver_like_labels() {
    for raw in ["1.0", "2.0.1-beta.3", "2026.03.01+build_7", "nightly"] {
        assert_eq!(RuntimeVersion::parse(raw).unwrap().as_str(), raw);
    }
}

/// Verifies surrounding whitespace is trimmed.
#[test]
fn trims_whitespace() {
    assert_eq!(RuntimeVersion::parse("  1.3\n").unwrap().as_str(), "1.3");
}

/// Verifies empty, oversized, and path-like labels are rejected.
#[test]
fn rejects_unsafe_labels() {
    assert_eq!(RuntimeVersion::parse("   "), Err(VersionError::Empty));
    assert_eq!(RuntimeVersion::parse("1.0/../x"), Err(VersionError::InvalidChar('/')));
    assert_eq!(RuntimeVersion::parse(".."), Err(VersionError::Reserved));
    assert_eq!(RuntimeVersion::parse("1 0"), Err(VersionError::InvalidChar(' ')));
    let long = "9".repeat(MAX_VERSION_LENGTH + 1);
    assert_eq!(
        RuntimeVersion::parse(&long),
        Err(VersionError::TooLong {
            max: MAX_VERSION_LENGTH,
            actual: MAX_VERSION_LENGTH + 1,
        })
    );
}

/// Verifies versions deserialize through validation.
#[test]
fn deserialize_validates() {
    let ok: RuntimeVersion = serde_json::from_str("\"2.0\"").unwrap();
    assert_eq!(ok.as_str(), "2.0");
    assert!(serde_json::from_str::<RuntimeVersion>("\"a/b\"").is_err());
}

proptest! {
    #[test]
    fn accepted_labels_are_safe_path_components(raw in ".{0,80}") {
        if let Ok(version) = RuntimeVersion::parse(&raw) {
            let label = version.as_str();
            prop_assert!(!label.contains('/') && !label.contains('\\'));
            prop_assert!(label != "." && label != "..");
            prop_assert!(label.len() <= MAX_VERSION_LENGTH);
        }
    }
}
