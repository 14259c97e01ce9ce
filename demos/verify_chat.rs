//! Ask an Oyster-hosted model a question and print the reply only if its
//! enclave signature verifies.
//!
//! ```bash
//! OYSTER_CHAT_URL=http://localhost:5000/api/chat \
//! OYSTER_ATTESTATION_URL=http://localhost:1500/attestation \
//! OYSTER_DIGEST_LAYOUT=packed \
//! RUST_LOG=oyster_verify=debug \
//! cargo run --example verify_chat -- llama3 "what is a TEE?"
//! ```

use oyster_verify::{Error, OysterClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let model = args.next().unwrap_or_else(|| "llama3".to_string());
    let question = args.next().unwrap_or_else(|| "hello".to_string());

    let client = OysterClient::from_env()?;
    println!("Chat endpoint:        {}", client.config().chat_url);
    println!("Attestation endpoint: {}", client.config().verifier.attestation_url);

    if !client.is_reachable().await {
        println!("Model server is not reachable");
        return Ok(());
    }

    match client.ask(&model, &question).await {
        Ok(response) => {
            println!("Verified response from {}:", response.model);
            println!("{}", response.message.content);
        }
        Err(Error::Rejected(rejection)) => {
            println!("Response REJECTED ({}); not displaying untrusted content", rejection);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
