//! `zenith init`: Write a default node configuration.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

const DEFAULT_CONFIG: &str = r#"# Zenith Node Configuration

[api]
listen_addr = "127.0.0.1"
port = 9001

[storage]
data_dir = "./data"

[logging]
level = "info"
format = "text"

[ledger]
# Blocks before the sender may reclaim an unconfirmed payment.
refund_window = 144
escrow_principal = "zenith-pay.escrow"

[chain]
# 0 disables automatic block production.
block_interval_ms = 10000
allow_mine = true

[[genesis.accounts]]
principal = "deployer"
balance = 100000000000000

[[genesis.accounts]]
principal = "wallet_1"
balance = 100000000000000
"#;

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("zenith.toml");

    if config_path.exists() {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    std::fs::create_dir_all(&args.dir)?;
    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("Initialized Zenith node at {}", config_path.display());
    println!("Edit zenith.toml to customize your configuration.");
    println!("Run 'zenith-node --config {}' to start the node.", config_path.display());

    // Create data directory
    let data_dir = args.dir.join("data");
    std::fs::create_dir_all(&data_dir)?;

    Ok(())
}
