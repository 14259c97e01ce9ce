//! Ethereum-style signer addresses
//!
//! An address is the low 20 bytes of `keccak256(X || Y)`. Equality is byte
//! equality; parsing accepts any case.

use k256::ecdsa::VerifyingKey;

pub use alloy_primitives::Address;

use crate::error::{Error, Result};

/// Derive an address from raw key bytes: 64 bytes of X‖Y, or 65 bytes with a
/// leading `0x04`. The point must be on the curve.
pub fn from_public_key_bytes(bytes: &[u8]) -> Result<Address> {
    let sec1 = match bytes.len() {
        64 => {
            let mut tagged = Vec::with_capacity(65);
            tagged.push(0x04);
            tagged.extend_from_slice(bytes);
            tagged
        }
        65 if bytes[0] == 0x04 => bytes.to_vec(),
        65 => {
            return Err(Error::InvalidAddress(format!(
                "unexpected public key prefix 0x{:02x}",
                bytes[0]
            )))
        }
        n => {
            return Err(Error::InvalidAddress(format!(
                "public key must be 64 or 65 bytes, got {}",
                n
            )))
        }
    };

    let key = VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|_| Error::InvalidAddress("public key is not a valid secp256k1 point".into()))?;
    Ok(Address::from_public_key(&key))
}

/// Parse an address in any case, with or without `0x`.
pub fn parse(s: &str) -> Result<Address> {
    s.trim()
        .parse()
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", s, e)))
}

/// Lowercase `0x`-prefixed hex.
pub fn to_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}
