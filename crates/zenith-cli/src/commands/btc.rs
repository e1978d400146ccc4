//! `zenith register-btc` / `zenith btc-address`: Settlement address registry.

use clap::Args;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{send, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Identity registering the address.
    #[arg(long)]
    pub caller: String,

    /// Bitcoin address to settle to.
    #[arg(short, long)]
    pub address: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Identity to look up.
    pub identity: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    caller: &'a str,
    address: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    owner: String,
    address: String,
    outcome: String,
    previous: Option<String>,
}

#[derive(Deserialize)]
struct AddressResponse {
    identity: String,
    address: String,
}

pub async fn register(args: &RegisterArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/btc-address", args.endpoint);
    let body = RegisterRequest {
        caller: &args.caller,
        address: &args.address,
    };

    let client = reqwest::Client::new();
    let request = client.post(&url).json(&body);
    if let Some(data) = send::<RegisterResponse>(request, &args.endpoint, "registration").await? {
        println!("Settlement address {}.", data.outcome);
        println!("  Owner:     {}", data.owner);
        println!("  Address:   {}", data.address);
        if let Some(previous) = data.previous {
            println!("  Replaced:  {}", previous);
        }
    }

    Ok(())
}

pub async fn lookup(args: &LookupArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/btc-address/{}", args.endpoint, args.identity);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: AddressResponse = r.json().await?;
            println!("{} -> {}", data.identity, data.address);
        }
        Ok(r) if r.status() == StatusCode::NOT_FOUND => {
            println!("No settlement address registered for {}", args.identity);
        }
        Ok(r) => {
            anyhow::bail!("lookup failed (HTTP {})", r.status());
        }
        Err(e) => super::unreachable_hint(&args.endpoint, &e),
    }

    Ok(())
}
