pub mod account;
pub mod btc;
pub mod channel;
pub mod init;
pub mod mine;
pub mod status;

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// API endpoint of a node started with the default configuration.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9001";

#[derive(Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub code: Option<u32>,
}

/// Send a request to the node and decode a successful reply.
///
/// Returns `Ok(None)` when the node could not be reached; the hint has
/// already been printed. Error replies become an `Err` naming `action`.
pub async fn send<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    endpoint: &str,
    action: &str,
) -> anyhow::Result<Option<T>> {
    match request.send().await {
        Ok(r) if r.status().is_success() => Ok(Some(r.json().await?)),
        Ok(r) => {
            let status = r.status();
            match r.json::<ErrorResponse>().await {
                Ok(ErrorResponse {
                    error,
                    code: Some(code),
                }) => anyhow::bail!("{} failed (HTTP {}, err u{}): {}", action, status, code, error),
                Ok(ErrorResponse { error, code: None }) => {
                    anyhow::bail!("{} failed (HTTP {}): {}", action, status, error)
                }
                Err(_) => anyhow::bail!("{} failed (HTTP {})", action, status),
            }
        }
        Err(e) => {
            unreachable_hint(endpoint, &e);
            Ok(None)
        }
    }
}

pub fn unreachable_hint(endpoint: &str, e: &reqwest::Error) {
    println!("Could not reach node at {}", endpoint);
    println!("  Error: {}", e);
    println!();
    println!("Is the node running? Start it with: zenith-node");
}
