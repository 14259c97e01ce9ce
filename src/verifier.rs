//! Response verification
//!
//! A response is accepted only when the signer recovered from its signature
//! is the signer the attestation endpoint reports. Every other outcome,
//! including network failures, is a rejection.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::address::{self, Address};
use crate::attestation::{self, AttestationPolicy, AttestationSource, HttpAttestationSource};
use crate::config::VerifierConfig;
use crate::digest::{self, Digest};
use crate::error::{Error, Result};
use crate::signature::RecoverableSignature;

/// One completed chat round trip, as received
///
/// `prompt` is the full templated prompt the server was sent, since that is
/// what the enclave signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub model: String,
    pub prompt: String,
    pub response_text: String,
    pub timestamp_header: String,
    pub signature_header: String,
}

impl ChatExchange {
    /// Digest the enclave is expected to have signed.
    ///
    /// The timestamp is signed as the header string, not as a number.
    pub fn digest(&self, config: &VerifierConfig) -> Digest {
        digest::exchange_digest(
            &config.tags,
            config.layout,
            &self.model,
            &self.prompt,
            &self.response_text,
            &self.timestamp_header,
        )
    }
}

/// Why a response was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    InvalidSignatureFormat,
    RecoveryFailure,
    AttestationUnreachable,
    AttestationMalformed,
    AddressMismatch,
    /// The attested key is not the pinned signer
    UntrustedAttestation,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::InvalidSignatureFormat => "invalid signature format",
            RejectReason::RecoveryFailure => "signer recovery failed",
            RejectReason::AttestationUnreachable => "attestation unreachable",
            RejectReason::AttestationMalformed => "attestation malformed",
            RejectReason::AddressMismatch => "signer does not match attestation",
            RejectReason::UntrustedAttestation => "attested signer is not the pinned signer",
        };
        f.write_str(s)
    }
}

/// A rejection and its diagnostic detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectReason,
    pub detail: String,
}

impl Rejection {
    pub fn new(reason: RejectReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    /// Classify an error raised while verifying.
    pub(crate) fn from_error(error: Error) -> Self {
        let reason = match &error {
            Error::InvalidSignatureFormat(_) => RejectReason::InvalidSignatureFormat,
            Error::RecoveryFailure(_) => RejectReason::RecoveryFailure,
            Error::AttestationMalformed(_) | Error::InvalidAddress(_) | Error::Json(_) => {
                RejectReason::AttestationMalformed
            }
            Error::AttestationUnreachable(_) | Error::Http(_) | Error::Api { .. } => {
                RejectReason::AttestationUnreachable
            }
            Error::Rejected(rejection) => rejection.reason,
            // Anything else still fails closed
            Error::Config(_) | Error::MissingHeader(_) | Error::InvalidHeader(_) => {
                RejectReason::AttestationUnreachable
            }
        };
        Self::new(reason, error.to_string())
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}

/// Outcome of verifying one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// Carries the now-trusted response text
    Accepted(String),
    Rejected(Rejection),
}

impl VerificationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationResult::Accepted(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            VerificationResult::Accepted(_) => None,
            VerificationResult::Rejected(r) => Some(r.reason),
        }
    }

    /// The trusted text, or the rejection as an error.
    pub fn into_result(self) -> Result<String> {
        match self {
            VerificationResult::Accepted(text) => Ok(text),
            VerificationResult::Rejected(r) => Err(Error::Rejected(r)),
        }
    }
}

/// Verifies signed chat responses against an attested signer
///
/// Holds only read-only configuration, so one verifier can serve concurrent
/// verifications.
#[derive(Debug, Clone)]
pub struct ResponseVerifier<S = HttpAttestationSource> {
    config: VerifierConfig,
    source: S,
}

impl ResponseVerifier<HttpAttestationSource> {
    /// Verifier that fetches attestations from `config.attestation_url`.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        let source =
            HttpAttestationSource::new(config.attestation_url.clone(), config.attestation_timeout)?;
        Ok(Self { config, source })
    }
}

impl<S: AttestationSource> ResponseVerifier<S> {
    /// Verifier with a custom attestation source.
    pub fn with_source(config: VerifierConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify an exchange. Never fails open.
    pub async fn verify(&self, exchange: &ChatExchange) -> VerificationResult {
        match self.check(exchange).await {
            Ok(signer) => {
                info!(model = %exchange.model, signer = %address::to_hex(&signer), "response verified");
                VerificationResult::Accepted(exchange.response_text.clone())
            }
            Err(rejection) => {
                warn!(
                    model = %exchange.model,
                    reason = ?rejection.reason,
                    detail = %rejection.detail,
                    "response rejected"
                );
                VerificationResult::Rejected(rejection)
            }
        }
    }

    async fn check(&self, exchange: &ChatExchange) -> std::result::Result<Address, Rejection> {
        // Local checks first: a malformed signature needs no network round trip
        let signature =
            RecoverableSignature::from_hex(&exchange.signature_header).map_err(Rejection::from_error)?;

        let digest = exchange.digest(&self.config);
        debug!(digest = %hex::encode(digest), layout = ?self.config.layout, "computed exchange digest");

        let recovered = signature.recover_address(&digest).map_err(Rejection::from_error)?;

        let attested = attestation::resolve_with(&self.source)
            .await
            .map_err(Rejection::from_error)?;

        match self.config.policy {
            AttestationPolicy::TrustReportedKey => {
                warn!(
                    attested = %address::to_hex(&attested),
                    "attestation document not validated; trusting reported key"
                );
            }
            AttestationPolicy::PinnedSigner(pinned) => {
                if attested != pinned {
                    return Err(Rejection::new(
                        RejectReason::UntrustedAttestation,
                        format!(
                            "attested {}, pinned {}",
                            address::to_hex(&attested),
                            address::to_hex(&pinned)
                        ),
                    ));
                }
            }
        }

        if recovered != attested {
            return Err(Rejection::new(
                RejectReason::AddressMismatch,
                format!(
                    "recovered {}, attested {}",
                    address::to_hex(&recovered),
                    address::to_hex(&attested)
                ),
            ));
        }

        Ok(recovered)
    }
}
