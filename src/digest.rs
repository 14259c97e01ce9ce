//! Domain-separated Keccak-256 digests
//!
//! The signed digest is
//! `keccak256(encode(string tag1, string tag2, bytes payload))` where
//! `payload` is the ABI encoding of the exchange's four string fields.

use serde::{Deserialize, Serialize};

use crate::abi::{self, Token};

/// First domain-separation tag used by the Oyster signer
pub const HASHER_TAG: &str = "|oyster-hasher|";

/// Second domain-separation tag, naming the signed parameter set
pub const PARAMETERS_TAG: &str = "|ollama_signature_parameters|";

/// 32-byte Keccak-256 output
pub type Digest = [u8; 32];

/// Keccak-256 (the pre-standard SHA-3 padding used by Ethereum).
pub fn keccak256(data: &[u8]) -> Digest {
    alloy_primitives::keccak256(data).0
}

/// How the tags and payload are laid out before the outer hash
///
/// The deployed Oyster signer hashes the `Packed` layout. With the default
/// `Abi` layout, genuine responses from that signer are rejected as
/// `AddressMismatch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestLayout {
    /// `abi.encode(string, string, bytes)`: payload is length-prefixed
    #[default]
    Abi,
    /// `abi.encodePacked(string, string, bytes)`: plain concatenation
    Packed,
}

impl std::str::FromStr for DigestLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abi" => Ok(DigestLayout::Abi),
            "packed" => Ok(DigestLayout::Packed),
            other => Err(format!("unknown digest layout '{}'", other)),
        }
    }
}

/// The pair of literal tags prefixed to every signed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTags {
    pub hasher: String,
    pub parameters: String,
}

impl Default for DomainTags {
    fn default() -> Self {
        Self {
            hasher: HASHER_TAG.to_string(),
            parameters: PARAMETERS_TAG.to_string(),
        }
    }
}

impl DomainTags {
    /// Hash an already-encoded payload under these tags.
    pub fn hash(&self, layout: DigestLayout, payload: &[u8]) -> Digest {
        domain_hash(self.hasher.as_bytes(), self.parameters.as_bytes(), payload, layout)
    }
}

/// Hash `payload` under two domain tags.
///
/// Tags must be valid UTF-8 in the ABI layout since they are encoded as
/// `string`; both layouts encode UTF-8 strings and raw bytes identically.
pub fn domain_hash(tag1: &[u8], tag2: &[u8], payload: &[u8], layout: DigestLayout) -> Digest {
    let tokens = [Token::Bytes(tag1), Token::Bytes(tag2), Token::Bytes(payload)];
    let preimage = match layout {
        DigestLayout::Abi => abi::encode(&tokens),
        DigestLayout::Packed => abi::encode_packed(&tokens),
    };
    keccak256(&preimage)
}

/// Canonical digest of a chat exchange's signed fields.
pub fn exchange_digest(
    tags: &DomainTags,
    layout: DigestLayout,
    model: &str,
    prompt: &str,
    response: &str,
    timestamp: &str,
) -> Digest {
    let payload = abi::encode_strings(&[model, prompt, response, timestamp]);
    tags.hash(layout, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_wire_tags_unchanged() {
        let tags = DomainTags::default();
        assert_eq!(tags.hasher.as_bytes(), b"|oyster-hasher|");
        assert_eq!(tags.parameters.as_bytes(), b"|ollama_signature_parameters|");
    }

    #[test]
    fn test_string_and_bytes_encode_alike() {
        let as_strings = abi::encode(&[Token::String(HASHER_TAG)]);
        let as_bytes = abi::encode(&[Token::Bytes(HASHER_TAG.as_bytes())]);
        assert_eq!(as_strings, as_bytes);
    }

    #[test]
    fn test_packed_layout_is_plain_concatenation() {
        let payload = [1u8, 2, 3];
        let digest = domain_hash(b"|a|", b"|b|", &payload, DigestLayout::Packed);
        assert_eq!(digest, keccak256(b"|a||b|\x01\x02\x03"));
    }

    #[test]
    fn test_packed_exchange_digest_matches_deployed_signer() {
        // keccak256(solidityPacked(["string", "string", "bytes"], [tag1, tag2, payload]))
        let payload = abi::encode_strings(&["llama3", "p", "hi there", "1700000000"]);
        let mut preimage = Vec::new();
        preimage.extend_from_slice(b"|oyster-hasher|");
        preimage.extend_from_slice(b"|ollama_signature_parameters|");
        preimage.extend_from_slice(&payload);

        let tags = DomainTags::default();
        assert_eq!(
            exchange_digest(&tags, DigestLayout::Packed, "llama3", "p", "hi there", "1700000000"),
            keccak256(&preimage)
        );
        assert_eq!(DigestLayout::default(), DigestLayout::Abi);
    }

    #[test]
    fn test_layouts_differ() {
        let tags = DomainTags::default();
        let payload = abi::encode_strings(&["m", "p", "r", "t"]);
        assert_ne!(
            tags.hash(DigestLayout::Abi, &payload),
            tags.hash(DigestLayout::Packed, &payload)
        );
    }

    #[test]
    fn test_tags_separate_domains() {
        let payload = abi::encode_strings(&["m", "p", "r", "t"]);
        let other = DomainTags {
            hasher: "|other-hasher|".into(),
            parameters: PARAMETERS_TAG.into(),
        };
        assert_ne!(
            DomainTags::default().hash(DigestLayout::Abi, &payload),
            other.hash(DigestLayout::Abi, &payload)
        );
    }

    #[test]
    fn test_exchange_digest_binds_every_field() {
        let tags = DomainTags::default();
        let base = exchange_digest(&tags, DigestLayout::Abi, "llama3", "p", "hi there", "1700000000");
        assert_ne!(base, exchange_digest(&tags, DigestLayout::Abi, "llama2", "p", "hi there", "1700000000"));
        assert_ne!(base, exchange_digest(&tags, DigestLayout::Abi, "llama3", "q", "hi there", "1700000000"));
        assert_ne!(base, exchange_digest(&tags, DigestLayout::Abi, "llama3", "p", "hi there!", "1700000000"));
        assert_ne!(base, exchange_digest(&tags, DigestLayout::Abi, "llama3", "p", "hi there", "1700000001"));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("abi".parse::<DigestLayout>().unwrap(), DigestLayout::Abi);
        assert_eq!("Packed".parse::<DigestLayout>().unwrap(), DigestLayout::Packed);
        assert!("rlp".parse::<DigestLayout>().is_err());
    }
}
