//! Verifier and client configuration
//!
//! Defaults point at the public Oyster deployment. Every value can be
//! overridden from the environment.

use std::time::Duration;

use reqwest::Url;

use crate::address;
use crate::attestation::AttestationPolicy;
use crate::digest::{DigestLayout, DomainTags};
use crate::error::{Error, Result};

pub const DEFAULT_ATTESTATION_URL: &str = "http://13.201.44.4:1500/attestation";
pub const DEFAULT_CHAT_URL: &str = "http://13.201.44.4:5000/api/chat";

/// Attestation fetches are always bounded
pub const DEFAULT_ATTESTATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const ENV_ATTESTATION_URL: &str = "OYSTER_ATTESTATION_URL";
pub const ENV_ATTESTATION_TIMEOUT_MS: &str = "OYSTER_ATTESTATION_TIMEOUT_MS";
pub const ENV_DIGEST_LAYOUT: &str = "OYSTER_DIGEST_LAYOUT";
pub const ENV_PINNED_SIGNER: &str = "OYSTER_PINNED_SIGNER";
pub const ENV_CHAT_URL: &str = "OYSTER_CHAT_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "OYSTER_REQUEST_TIMEOUT_MS";

/// Read-only settings shared by every verification
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub attestation_url: Url,
    pub attestation_timeout: Duration,
    pub tags: DomainTags,
    pub layout: DigestLayout,
    pub policy: AttestationPolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            attestation_url: default_url(DEFAULT_ATTESTATION_URL),
            attestation_timeout: DEFAULT_ATTESTATION_TIMEOUT,
            tags: DomainTags::default(),
            layout: DigestLayout::default(),
            policy: AttestationPolicy::default(),
        }
    }
}

impl VerifierConfig {
    pub fn new(attestation_url: Url) -> Self {
        Self {
            attestation_url,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.attestation_timeout = timeout;
        self
    }

    pub fn with_layout(mut self, layout: DigestLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_tags(mut self, tags: DomainTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_policy(mut self, policy: AttestationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_ATTESTATION_URL) {
            config.attestation_url = parse_url(ENV_ATTESTATION_URL, &url)?;
        }
        if let Some(ms) = lookup(ENV_ATTESTATION_TIMEOUT_MS) {
            config.attestation_timeout = parse_timeout(ENV_ATTESTATION_TIMEOUT_MS, &ms)?;
        }
        if let Some(layout) = lookup(ENV_DIGEST_LAYOUT) {
            config.layout = layout
                .parse()
                .map_err(|e| Error::Config(format!("{}: {}", ENV_DIGEST_LAYOUT, e)))?;
        }
        if let Some(pinned) = lookup(ENV_PINNED_SIGNER) {
            let address = address::parse(&pinned)
                .map_err(|e| Error::Config(format!("{}: {}", ENV_PINNED_SIGNER, e)))?;
            config.policy = AttestationPolicy::PinnedSigner(address);
        }

        Ok(config)
    }
}

/// Settings for the chat client
///
/// `verifier.layout` defaults to `Abi`. The deployed Oyster signer uses the
/// packed layout, so set `OYSTER_DIGEST_LAYOUT=packed` (or
/// `verifier.layout = DigestLayout::Packed`) when talking to it, or every
/// genuine reply is rejected as `AddressMismatch`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub chat_url: Url,
    pub request_timeout: Duration,
    /// Optional system message sent before the templated query
    pub system_prompt: Option<String>,
    pub verifier: VerifierConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chat_url: default_url(DEFAULT_CHAT_URL),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            system_prompt: None,
            verifier: VerifierConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(chat_url: Url, verifier: VerifierConfig) -> Self {
        Self {
            chat_url,
            verifier,
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            verifier: VerifierConfig::from_lookup(&lookup)?,
            ..Self::default()
        };

        if let Some(url) = lookup(ENV_CHAT_URL) {
            config.chat_url = parse_url(ENV_CHAT_URL, &url)?;
        }
        if let Some(ms) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout = parse_timeout(ENV_REQUEST_TIMEOUT_MS, &ms)?;
        }

        Ok(config)
    }
}

fn default_url(url: &str) -> Url {
    match Url::parse(url) {
        Ok(url) => url,
        Err(e) => unreachable!("built-in URL {} is invalid: {}", url, e),
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::Config(format!("{}: invalid URL '{}': {}", key, value, e)))
}

fn parse_timeout(key: &str, value: &str) -> Result<Duration> {
    let ms: u64 = value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{}: invalid milliseconds '{}': {}", key, value, e)))?;
    if ms == 0 {
        return Err(Error::Config(format!("{}: timeout must be non-zero", key)));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.attestation_url.as_str(), DEFAULT_ATTESTATION_URL);
        assert_eq!(config.attestation_timeout, DEFAULT_ATTESTATION_TIMEOUT);
        assert_eq!(config.layout, DigestLayout::Abi);
        assert_eq!(config.policy, AttestationPolicy::TrustReportedKey);

        let client = ClientConfig::default();
        assert_eq!(client.chat_url.as_str(), DEFAULT_CHAT_URL);
        assert!(client.system_prompt.is_none());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_ATTESTATION_URL, "http://localhost:1500/attestation"),
            (ENV_ATTESTATION_TIMEOUT_MS, "250"),
            (ENV_DIGEST_LAYOUT, "packed"),
            (ENV_PINNED_SIGNER, "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"),
            (ENV_CHAT_URL, "http://localhost:5000/api/chat"),
        ]))
        .unwrap();

        assert_eq!(config.chat_url.as_str(), "http://localhost:5000/api/chat");
        assert_eq!(config.verifier.attestation_url.as_str(), "http://localhost:1500/attestation");
        assert_eq!(config.verifier.attestation_timeout, Duration::from_millis(250));
        assert_eq!(config.verifier.layout, DigestLayout::Packed);
        assert!(matches!(config.verifier.policy, AttestationPolicy::PinnedSigner(_)));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for (key, value) in [
            (ENV_ATTESTATION_URL, "not a url"),
            (ENV_ATTESTATION_TIMEOUT_MS, "soon"),
            (ENV_ATTESTATION_TIMEOUT_MS, "0"),
            (ENV_DIGEST_LAYOUT, "rlp"),
            (ENV_PINNED_SIGNER, "0x1234"),
        ] {
            let err = VerifierConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{}={}", key, value);
        }
    }
}
