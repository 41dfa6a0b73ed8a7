// crates/launchpad-fetch/src/http.rs
// ============================================================================
// Module: Launchpad HTTP Fetchers
// Description: Manifest client and payload fetcher over HTTP(S).
// Purpose: Issue bounded, single-shot GET requests with redirects disabled.
// Dependencies: launchpad-core, reqwest
// ============================================================================

//! ## Overview
//! Both adapters use blocking [`Client`]s configured with the transport
//! policy's connect timeout and user agent. Manifest requests never follow
//! redirects; a redirect status is reported as a network failure. Payload
//! requests follow a bounded number of redirects, and every hop must stay on
//! an HTTP(S) scheme the policy permits. Payloads are digest-checked after
//! download. Response bodies are read under hard size limits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use launchpad_core::DownloadRequest;
use launchpad_core::FetchError;
use launchpad_core::Manifest;
use launchpad_core::ManifestSource;
use launchpad_core::PayloadSource;
use launchpad_core::StagingArtifact;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Action;
use reqwest::redirect::Attempt;
use reqwest::redirect::Policy;
use url::Url;

use crate::manifest::parse_manifest;
use crate::policy::SourceScheme;
use crate::policy::TransportPolicy;
use crate::stream::stream_to_scratch;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum redirect hops followed for a payload download.
pub const MAX_PAYLOAD_REDIRECTS: usize = 10;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Builds the manifest HTTP client for `policy`; redirects are not followed.
///
/// # Errors
///
/// Returns [`FetchError::Network`] when the client cannot be built.
pub fn build_client(policy: &TransportPolicy) -> Result<Client, FetchError> {
    build_with_redirects(policy, Policy::none())
}

/// Builds the payload HTTP client for `policy`.
///
/// Redirects are followed up to [`MAX_PAYLOAD_REDIRECTS`] hops; a hop to a
/// scheme the policy does not permit for HTTP stops the request.
///
/// # Errors
///
/// Returns [`FetchError::Network`] when the client cannot be built.
pub fn build_payload_client(policy: &TransportPolicy) -> Result<Client, FetchError> {
    let hop_policy = policy.clone();
    let redirects = Policy::custom(move |attempt: Attempt<'_>| -> Action {
        if attempt.previous().len() >= MAX_PAYLOAD_REDIRECTS {
            return attempt.error(format!("more than {MAX_PAYLOAD_REDIRECTS} redirects"));
        }
        match http_url(&hop_policy, attempt.url().as_str()) {
            Ok(_) => attempt.follow(),
            Err(err) => attempt.error(format!("redirect rejected: {err}")),
        }
    });
    build_with_redirects(policy, redirects)
}

/// Builds a blocking client with the policy's timeouts and user agent.
fn build_with_redirects(policy: &TransportPolicy, redirects: Policy) -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(policy.connect_timeout)
        .user_agent(policy.user_agent.clone())
        .redirect(redirects)
        .build()
        .map_err(|err| FetchError::Network(format!("http client build failed: {err}")))
}

// ============================================================================
// SECTION: Manifest Client
// ============================================================================

/// Manifest client over HTTP(S).
///
/// # Invariants
/// - Exactly one request per call; no retries.
/// - Bodies larger than `max_manifest_bytes` fail closed.
#[derive(Debug, Clone)]
pub struct HttpManifestClient {
    /// Shared HTTP client.
    client: Client,
    /// Transport policy.
    policy: TransportPolicy,
}

impl HttpManifestClient {
    /// Creates a manifest client with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] when the client cannot be built.
    pub fn new(policy: TransportPolicy) -> Result<Self, FetchError> {
        let client = build_client(&policy)?;
        Ok(Self::with_client(client, policy))
    }

    /// Creates a manifest client sharing an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: Client, policy: TransportPolicy) -> Self {
        Self {
            client,
            policy,
        }
    }
}

impl ManifestSource for HttpManifestClient {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Manifest, FetchError> {
        let url = http_url(&self.policy, url)?;
        let mut response = send(&self.client, url, timeout)?;
        let body = read_response_limited(&mut response, self.policy.max_manifest_bytes)?;
        parse_manifest(&body, &self.policy)
    }
}

// ============================================================================
// SECTION: Payload Fetcher
// ============================================================================

/// Payload fetcher over HTTP(S).
///
/// # Invariants
/// - The payload is streamed into scratch storage, never into an install
///   directory.
/// - Partial files are removed on every error path.
/// - Redirects are followed only to HTTP(S) URLs the policy permits.
#[derive(Debug, Clone)]
pub struct HttpPayloadFetcher {
    /// Shared HTTP client.
    client: Client,
    /// Transport policy.
    policy: TransportPolicy,
}

impl HttpPayloadFetcher {
    /// Creates a payload fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] when the client cannot be built.
    pub fn new(policy: TransportPolicy) -> Result<Self, FetchError> {
        let client = build_payload_client(&policy)?;
        Ok(Self::with_client(client, policy))
    }

    /// Creates a payload fetcher sharing an existing HTTP client.
    ///
    /// The client should come from [`build_payload_client`] so redirects are
    /// checked against the policy.
    #[must_use]
    pub const fn with_client(client: Client, policy: TransportPolicy) -> Self {
        Self {
            client,
            policy,
        }
    }
}

impl PayloadSource for HttpPayloadFetcher {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<StagingArtifact, FetchError> {
        if request.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let url = http_url(&self.policy, request.url)?;
        let response = send(&self.client, url, request.timeout)?;
        http_url(&self.policy, response.url().as_str())?;
        let total = response.content_length();
        stream_to_scratch(response, request, total, self.policy.max_payload_bytes)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses `raw` and requires an HTTP(S) scheme permitted by the policy.
fn http_url(policy: &TransportPolicy, raw: &str) -> Result<Url, FetchError> {
    match policy.classify(raw)? {
        (url, SourceScheme::Http) => Ok(url),
        (url, SourceScheme::File) => Err(FetchError::UnsupportedScheme(url.scheme().to_string())),
    }
}

/// Sends a GET request and rejects non-success statuses.
fn send(client: &Client, url: Url, timeout: Duration) -> Result<Response, FetchError> {
    let response = client.get(url).timeout(timeout).send().map_err(|err| {
        if err.is_timeout() {
            FetchError::Network(format!("request timed out: {err}"))
        } else {
            FetchError::Network(format!("request failed: {err}"))
        }
    })?;
    let status = response.status();
    if status.is_redirection() {
        return Err(FetchError::Network(format!(
            "redirect not followed (status {})",
            status.as_u16()
        )));
    }
    if !status.is_success() {
        return Err(FetchError::Network(format!("server returned status {}", status.as_u16())));
    }
    Ok(response)
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: &mut Response, max_bytes: u64) -> Result<Vec<u8>, FetchError> {
    let expected_len = response.content_length();
    if let Some(expected) = expected_len
        && expected > max_bytes
    {
        return Err(FetchError::TooLarge {
            max_bytes,
            actual_bytes: expected,
        });
    }
    let mut buf = Vec::new();
    let mut handle = response.take(max_bytes.saturating_add(1));
    handle
        .read_to_end(&mut buf)
        .map_err(|err| FetchError::Network(format!("failed to read response: {err}")))?;
    let received = u64::try_from(buf.len()).unwrap_or(u64::MAX);
    if received > max_bytes {
        return Err(FetchError::TooLarge {
            max_bytes,
            actual_bytes: received,
        });
    }
    if let Some(expected) = expected_len
        && received < expected
    {
        return Err(FetchError::Network("response truncated".to_string()));
    }
    Ok(buf)
}
