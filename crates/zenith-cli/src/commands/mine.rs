//! `zenith mine`: Produce blocks on a devnet node.

use clap::Args;
use serde::{Deserialize, Serialize};

use super::{send, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct MineArgs {
    /// Number of blocks to produce.
    #[arg(short, long, default_value_t = 1)]
    pub blocks: u64,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct MineRequest {
    blocks: u64,
}

#[derive(Deserialize)]
struct ChainStatus {
    height: u64,
}

pub async fn run(args: &MineArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/chain/mine", args.endpoint);
    let body = MineRequest {
        blocks: args.blocks,
    };

    let client = reqwest::Client::new();
    let request = client.post(&url).json(&body);
    if let Some(data) = send::<ChainStatus>(request, &args.endpoint, "mine").await? {
        println!("Mined {} block(s), height is now {}", args.blocks, data.height);
    }

    Ok(())
}
