//! Chat client that only returns verified responses
//!
//! Each call:
//! 1. Wraps the user message in the instruction template
//! 2. POSTs the chat request to the enclave
//! 3. Reads the signature and timestamp headers
//! 4. Verifies the signature against the attested signer
//! 5. Returns the response only if it was accepted

use tracing::{debug, info};

use crate::api::{ChatMessage, ChatRequest, ChatResponse, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::attestation::{AttestationSource, HttpAttestationSource};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::prompt;
use crate::verifier::{ChatExchange, Rejection, ResponseVerifier, VerificationResult};

/// Client for an Oyster-hosted model server
///
/// The deployed Oyster signer hashes the packed digest layout, so talking to
/// it needs [`DigestLayout::Packed`](crate::digest::DigestLayout::Packed) in
/// the verifier config (`OYSTER_DIGEST_LAYOUT=packed`). With the default
/// `Abi` layout every genuine reply from that signer is rejected as
/// `AddressMismatch`.
pub struct OysterClient<S = HttpAttestationSource> {
    config: ClientConfig,
    http: reqwest::Client,
    verifier: ResponseVerifier<S>,
}

impl OysterClient<HttpAttestationSource> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let verifier = ResponseVerifier::new(config.verifier.clone())?;
        Self::with_verifier(config, verifier)
    }

    /// Client configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<S: AttestationSource> OysterClient<S> {
    /// Create a client around an existing verifier.
    pub fn with_verifier(config: ClientConfig, verifier: ResponseVerifier<S>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http,
            verifier,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn verifier(&self) -> &ResponseVerifier<S> {
        &self.verifier
    }

    /// Build the request for a user message.
    pub fn request_for(&self, model: &str, message: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt::templated_query(message)));
        ChatRequest::new(model, messages)
    }

    /// Ask the model and return its response only if the enclave signature
    /// verifies.
    pub async fn ask(&self, model: &str, message: &str) -> Result<ChatResponse> {
        let request = self.request_for(model, message);
        let (response, exchange) = match self.send(&request).await {
            Ok(sent) => sent,
            Err(e @ Error::InvalidSignatureFormat(_)) => {
                return Err(Error::Rejected(Rejection::from_error(e)))
            }
            Err(e) => return Err(e),
        };

        match self.verifier.verify(&exchange).await {
            VerificationResult::Accepted(_) => Ok(response),
            VerificationResult::Rejected(rejection) => Err(Error::Rejected(rejection)),
        }
    }

    /// Send a request and capture everything needed to verify the reply.
    ///
    /// The returned response is unverified.
    pub async fn send(&self, request: &ChatRequest) -> Result<(ChatResponse, ChatExchange)> {
        debug!(url = %self.config.chat_url, model = %request.model, "sending chat request");

        let response = self
            .http
            .post(self.config.chat_url.clone())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, message: body });
        }

        let timestamp = header(&response, TIMESTAMP_HEADER)?;
        let signature = header(&response, SIGNATURE_HEADER).map_err(|e| match e {
            Error::InvalidHeader(name) => {
                Error::InvalidSignatureFormat(format!("{} header is not visible ASCII", name))
            }
            other => other,
        })?;

        let body = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&body)?;

        let exchange = ChatExchange {
            model: chat.model.clone(),
            prompt: request.signed_prompt().unwrap_or_default().to_string(),
            response_text: chat.message.content.clone(),
            timestamp_header: timestamp,
            signature_header: signature,
        };

        Ok((chat, exchange))
    }

    /// Whether the model server answers on its base URL.
    pub async fn is_reachable(&self) -> bool {
        let mut base = self.config.chat_url.clone();
        base.set_path("/");
        base.set_query(None);

        match self.http.get(base).send().await {
            Ok(response) => {
                info!(status = %response.status(), "model server responded");
                response.status() == reqwest::StatusCode::OK
            }
            Err(e) => {
                debug!(error = %e, "model server unreachable");
                false
            }
        }
    }
}

fn header(response: &reqwest::Response, name: &'static str) -> Result<String> {
    let value = response
        .headers()
        .get(name)
        .ok_or(Error::MissingHeader(name))?;
    value
        .to_str()
        .map(str::to_string)
        .map_err(|_| Error::InvalidHeader(name))
}
