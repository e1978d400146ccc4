//! Zenith CLI: Command-line client for the Zenith Pay ledger node.
//!
//! Subcommands: init, status, open, pay, confirm, refund, close, channel,
//! channels, register-btc, btc-address, balance, mine.

mod commands;

use clap::{Parser, Subcommand};

/// Zenith: Escrow payment channels with Bitcoin settlement addresses.
#[derive(Parser, Debug)]
#[command(name = "zenith", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default node configuration.
    Init(commands::init::InitArgs),
    /// Query chain height and escrow totals of a running node.
    Status(commands::status::StatusArgs),
    /// Open a channel, escrowing funds from the caller.
    Open(commands::channel::OpenArgs),
    /// Execute a payment on a channel (sender only).
    Pay(commands::channel::PayArgs),
    /// Confirm the pending payment on a channel (receiver only).
    Confirm(commands::channel::SettleArgs),
    /// Refund an expired pending payment (sender only).
    Refund(commands::channel::SettleArgs),
    /// Close a channel and return unsettled escrow to the sender.
    Close(commands::channel::SettleArgs),
    /// Show a channel.
    Channel(commands::channel::InfoArgs),
    /// List channels an identity takes part in.
    Channels(commands::channel::ListArgs),
    /// Register the caller's Bitcoin settlement address.
    RegisterBtc(commands::btc::RegisterArgs),
    /// Look up an identity's Bitcoin settlement address.
    BtcAddress(commands::btc::LookupArgs),
    /// Show an account balance.
    Balance(commands::account::BalanceArgs),
    /// Produce blocks on a devnet node.
    Mine(commands::mine::MineArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Open(args) => commands::channel::open(args).await,
        Commands::Pay(args) => commands::channel::pay(args).await,
        Commands::Confirm(args) => commands::channel::settle(args, "confirm").await,
        Commands::Refund(args) => commands::channel::settle(args, "refund").await,
        Commands::Close(args) => commands::channel::settle(args, "close").await,
        Commands::Channel(args) => commands::channel::info(args).await,
        Commands::Channels(args) => commands::channel::list(args).await,
        Commands::RegisterBtc(args) => commands::btc::register(args).await,
        Commands::BtcAddress(args) => commands::btc::lookup(args).await,
        Commands::Balance(args) => commands::account::run(args).await,
        Commands::Mine(args) => commands::mine::run(args).await,
    }
}
