//! `zenith status`: Query the status of a running Zenith node.

use clap::Args;
use serde::Deserialize;

use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    height: u64,
    channels: usize,
    escrow: String,
    escrow_balance: u128,
    refund_window: u64,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/status", args.endpoint);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let status: StatusResponse = r.json().await?;
            println!("Node Status:");
            println!("  Version:        {}", status.version);
            println!("  Uptime:         {}s", status.uptime_secs);
            println!("  Height:         {}", status.height);
            println!("  Channels:       {}", status.channels);
            println!("  Escrow:         {}", status.escrow);
            println!("  Escrowed:       {}", status.escrow_balance);
            println!("  Refund window:  {} blocks", status.refund_window);
        }
        Ok(r) => {
            anyhow::bail!("node returned HTTP {}", r.status());
        }
        Err(e) => super::unreachable_hint(&args.endpoint, &e),
    }

    Ok(())
}
