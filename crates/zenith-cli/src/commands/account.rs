//! `zenith balance`: Show an account balance.

use clap::Args;
use serde::Deserialize;

use super::{send, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Identity to query.
    pub identity: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    identity: String,
    balance: u128,
}

pub async fn run(args: &BalanceArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/accounts/{}", args.endpoint, args.identity);
    let request = reqwest::Client::new().get(&url);
    if let Some(data) = send::<AccountResponse>(request, &args.endpoint, "balance").await? {
        println!("{}: {}", data.identity, data.balance);
    }

    Ok(())
}
