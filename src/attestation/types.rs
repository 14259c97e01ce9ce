//! Attestation endpoint payloads and trust policy

use serde::{Deserialize, Serialize};

use crate::address::{self, Address};
use crate::error::{Error, Result};

/// JSON field holding the enclave's secp256k1 signing key
pub const PUBLIC_KEY_FIELD: &str = "secp256k1_public";

/// Body returned by the attestation endpoint
///
/// Only the signing key is read; other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttestationDocument {
    pub secp256k1_public: String,
}

impl AttestationDocument {
    /// Parse a raw response body.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| {
            Error::AttestationMalformed(format!(
                "expected a JSON object with a string '{}': {}",
                PUBLIC_KEY_FIELD, e
            ))
        })
    }

    /// Decode the reported key and derive its address.
    pub fn signer_address(&self) -> Result<Address> {
        let trimmed = self.secp256k1_public.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| Error::AttestationMalformed(format!("public key is not valid hex: {}", e)))?;

        address::from_public_key_bytes(&bytes).map_err(|e| match e {
            Error::InvalidAddress(msg) => Error::AttestationMalformed(msg),
            other => other,
        })
    }
}

/// How far the attested key is trusted
///
/// The attestation document itself (enclave measurement, quote signature) is
/// never validated here. `TrustReportedKey` accepts whatever key the endpoint
/// reports. `PinnedSigner` additionally requires that key to belong to an
/// address the operator verified out of band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "address")]
pub enum AttestationPolicy {
    #[default]
    TrustReportedKey,
    PinnedSigner(Address),
}
