//! # Oyster response verification
//!
//! Checks that a chat completion was produced inside an attested Oyster
//! enclave and was not altered on the way back.
//!
//! ## Verification
//!
//! ### Step 1: Canonical digest
//! - ABI-encodes `(model, prompt, response, timestamp)` as four strings
//! - Hashes the encoding under the domain tags `|oyster-hasher|` and
//!   `|ollama_signature_parameters|` with Keccak-256
//!
//! ### Step 2: Signer recovery
//! - Parses the `x-oyster-signature` header as a 65-byte `r || s || v`
//!   signature
//! - Recovers the secp256k1 signer and derives its address
//!
//! ### Step 3: Attested signer
//! - Fetches the enclave's public key from the attestation endpoint
//! - Derives its address with the same rule
//!
//! ### Step 4: Comparison
//! - The response is accepted only if both addresses are equal
//!
//! ## Trust boundary
//!
//! The attestation document is not validated (no quote or measurement
//! checks): the endpoint's reported key is trusted as-is unless
//! [`AttestationPolicy::PinnedSigner`] is configured.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oyster_verify::{ChatExchange, ResponseVerifier, VerifierConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let verifier = ResponseVerifier::new(VerifierConfig::from_env()?)?;
//!
//!     let exchange = ChatExchange {
//!         model: "llama3".into(),
//!         prompt: oyster_verify::prompt::templated_query("hello"),
//!         response_text: "hi there".into(),
//!         timestamp_header: "1700000000".into(),
//!         signature_header: "0x...".into(),
//!     };
//!
//!     let text = verifier.verify(&exchange).await.into_result()?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

pub mod abi;
pub mod address;
pub mod api;
pub mod attestation;
pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod prompt;
pub mod signature;
pub mod verifier;

pub use address::Address;
pub use api::{ChatMessage, ChatRequest, ChatResponse};
pub use attestation::{AttestationPolicy, AttestationSource, HttpAttestationSource};
pub use client::OysterClient;
pub use config::{ClientConfig, VerifierConfig};
pub use digest::{DigestLayout, DomainTags};
pub use error::{Error, Result};
pub use signature::RecoverableSignature;
pub use verifier::{ChatExchange, RejectReason, Rejection, ResponseVerifier, VerificationResult};
