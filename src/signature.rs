//! secp256k1 signer recovery
//!
//! Signatures arrive as hex `r || s || v` (65 bytes). `v` may be a raw
//! recovery id (0/1) or Ethereum-style (27/28).

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tracing::debug;

use crate::address::{self, Address};
use crate::digest::Digest;
use crate::error::{Error, Result};

/// Length of an `r || s || v` signature
pub const SIGNATURE_LEN: usize = 65;

/// A parsed 65-byte recoverable signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    bytes: [u8; SIGNATURE_LEN],
}

impl RecoverableSignature {
    /// Parse a hex signature, with or without a leading `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| Error::InvalidSignatureFormat(format!("not valid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Parse raw signature bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidSignatureFormat(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            ))
        })?;

        let sig = Self { bytes };
        sig.recovery_byte()?;
        Ok(sig)
    }

    /// Build from a k256 signature and recovery id (test and tooling helper).
    pub fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// `v` normalized to 0 or 1
    fn recovery_byte(&self) -> Result<u8> {
        match self.bytes[64] {
            v @ (0 | 1) => Ok(v),
            v @ (27 | 28) => Ok(v - 27),
            v => Err(Error::InvalidSignatureFormat(format!(
                "recovery id must be 0, 1, 27 or 28, got {}",
                v
            ))),
        }
    }

    /// Recover the public key that signed `digest`.
    pub fn recover_key(&self, digest: &Digest) -> Result<VerifyingKey> {
        let v = self.recovery_byte()?;

        let signature = Signature::from_slice(&self.bytes[..64])
            .map_err(|_| Error::RecoveryFailure("r or s is zero or out of range".into()))?;
        let mut recovery_id = RecoveryId::from_byte(v)
            .ok_or_else(|| Error::InvalidSignatureFormat(format!("bad recovery id {}", v)))?;

        // Ethereum's ecrecover accepts high-s; k256 only verifies low-s.
        // Negating s mirrors R's y parity.
        let signature = match signature.normalize_s() {
            Some(low) => {
                recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
                low
            }
            None => signature,
        };

        VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
            .map_err(|e| Error::RecoveryFailure(format!("no key recovered: {}", e)))
    }

    /// Recover the address that signed `digest`.
    pub fn recover_address(&self, digest: &Digest) -> Result<Address> {
        let key = self.recover_key(digest)?;
        let signer = Address::from_public_key(&key);
        debug!(digest = %hex::encode(digest), signer = %address::to_hex(&signer), "recovered signer");
        Ok(signer)
    }
}

/// Recover the signer address of `digest` from a hex signature.
pub fn recover(digest: &Digest, signature_hex: &str) -> Result<Address> {
    RecoverableSignature::from_hex(signature_hex)?.recover_address(digest)
}
