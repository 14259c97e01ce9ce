//! Error types for the Oyster verifier

use thiserror::Error;

use crate::verifier::Rejection;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Signer recovery failed: {0}")]
    RecoveryFailure(String),

    #[error("Attestation endpoint unreachable: {0}")]
    AttestationUnreachable(String),

    #[error("Malformed attestation: {0}")]
    AttestationMalformed(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Response is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("Response header {0} is not visible ASCII")]
    InvalidHeader(&'static str),

    #[error("Response rejected: {0}")]
    Rejected(Rejection),

    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
