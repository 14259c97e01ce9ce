//! Attested signer resolution
//!
//! The enclave publishes its secp256k1 signing key on an attestation
//! endpoint. Resolving the expected signer is:
//! - GET the endpoint (bounded by a timeout)
//! - parse the JSON body and read `secp256k1_public`
//! - derive the address with the same hash-and-truncate rule used for
//!   recovered signers
//!
//! Nothing is cached: every verification fetches the key again so a rotated
//! key takes effect immediately.

pub mod types;

pub use types::{AttestationDocument, AttestationPolicy, PUBLIC_KEY_FIELD};

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use crate::address::{self, Address};
use crate::error::{Error, Result};

/// Something that can report the enclave's attestation document
pub trait AttestationSource {
    fn fetch(&self) -> impl Future<Output = Result<AttestationDocument>> + Send;
}

/// Fetches the attestation document over HTTP
#[derive(Debug, Clone)]
pub struct HttpAttestationSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpAttestationSource {
    /// Create a source with its own HTTP client bounded by `timeout`.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(endpoint, client))
    }

    /// Reuse an existing client. The client must carry a request timeout.
    pub fn with_client(endpoint: Url, client: reqwest::Client) -> Self {
        Self { client, endpoint }
    }
}

impl AttestationSource for HttpAttestationSource {
    async fn fetch(&self) -> Result<AttestationDocument> {
        fetch_from(&self.client, &self.endpoint).await
    }
}

/// Fetch and parse an attestation document.
pub async fn fetch_from(client: &reqwest::Client, endpoint: &Url) -> Result<AttestationDocument> {
    debug!(%endpoint, "fetching attestation");

    let response = client
        .get(endpoint.clone())
        .send()
        .await
        .map_err(|e| {
            warn!(%endpoint, error = %e, "attestation request failed");
            Error::AttestationUnreachable(format!("HTTP request failed: {}", e))
        })?;

    if !response.status().is_success() {
        return Err(Error::AttestationUnreachable(format!(
            "HTTP {}: {}",
            response.status(),
            response.status().canonical_reason().unwrap_or("Unknown error")
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::AttestationUnreachable(format!("Failed to read body: {}", e)))?;

    AttestationDocument::from_json(&body)
}

/// Resolve the attested signer address from any source.
pub async fn resolve_with<S: AttestationSource>(source: &S) -> Result<Address> {
    let doc = source.fetch().await?;
    let signer = doc.signer_address()?;
    debug!(signer = %address::to_hex(&signer), "attested signer resolved");
    Ok(signer)
}

/// Resolve the attested signer address from an HTTP endpoint.
pub async fn resolve(endpoint: Url, timeout: Duration) -> Result<Address> {
    let source = HttpAttestationSource::new(endpoint, timeout)?;
    resolve_with(&source).await
}
