//! Channel subcommands: `open`, `pay`, `confirm`, `refund`, `close`,
//! `channel`, and `channels`.

use clap::Args;
use serde::{Deserialize, Serialize};

use super::{send, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Identity funding the channel.
    #[arg(long)]
    pub caller: String,

    /// Identity that will receive payments.
    #[arg(short, long)]
    pub receiver: String,

    /// Amount to escrow, in the smallest unit.
    #[arg(short, long)]
    pub amount: u128,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// Channel sender.
    #[arg(long)]
    pub caller: String,

    /// Channel id.
    #[arg(long)]
    pub channel: u64,

    /// Payment amount.
    #[arg(short, long)]
    pub amount: u128,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

/// Arguments shared by `confirm`, `refund`, and `close`.
#[derive(Args, Debug)]
pub struct SettleArgs {
    /// Identity performing the call.
    #[arg(long)]
    pub caller: String,

    /// Channel id.
    #[arg(long)]
    pub channel: u64,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Channel id.
    pub channel: u64,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Identity whose channels to list.
    pub identity: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct OpenRequest<'a> {
    caller: &'a str,
    receiver: &'a str,
    amount: u128,
}

#[derive(Serialize)]
struct PayRequest<'a> {
    caller: &'a str,
    amount: u128,
}

#[derive(Serialize)]
struct CallerRequest<'a> {
    caller: &'a str,
}

#[derive(Deserialize)]
struct OpenResponse {
    channel_id: u64,
}

#[derive(Deserialize)]
struct PayResponse {
    channel_id: u64,
    amount: u128,
    deadline: u64,
}

#[derive(Deserialize)]
struct SettleResponse {
    channel_id: u64,
    amount: u128,
    status: String,
}

#[derive(Deserialize)]
struct ChannelInfo {
    id: u64,
    sender: String,
    receiver: String,
    capacity: u128,
    balance: u128,
    pending: u128,
    timeout: u64,
    state: String,
}

#[derive(Deserialize)]
struct ChannelList {
    channels: Vec<ChannelInfo>,
    count: usize,
}

fn print_channel(ch: &ChannelInfo) {
    println!("Channel {}:", ch.id);
    println!("  State:     {}", ch.state);
    println!("  Sender:    {}", ch.sender);
    println!("  Receiver:  {}", ch.receiver);
    println!("  Capacity:  {}", ch.capacity);
    println!("  Balance:   {}", ch.balance);
    if ch.pending > 0 {
        println!("  Pending:   {} (refundable at height {})", ch.pending, ch.timeout);
    } else {
        println!("  Pending:   none");
    }
}

pub async fn open(args: &OpenArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/channels", args.endpoint);
    let body = OpenRequest {
        caller: &args.caller,
        receiver: &args.receiver,
        amount: args.amount,
    };

    let client = reqwest::Client::new();
    let request = client.post(&url).json(&body);
    if let Some(data) = send::<OpenResponse>(request, &args.endpoint, "open").await? {
        println!("Channel opened!");
        println!("  Channel:   {}", data.channel_id);
        println!("  Escrowed:  {}", args.amount);
    }

    Ok(())
}

pub async fn pay(args: &PayArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/channels/{}/execute", args.endpoint, args.channel);
    let body = PayRequest {
        caller: &args.caller,
        amount: args.amount,
    };

    let client = reqwest::Client::new();
    let request = client.post(&url).json(&body);
    if let Some(data) = send::<PayResponse>(request, &args.endpoint, "payment").await? {
        println!("Payment executed!");
        println!("  Channel:   {}", data.channel_id);
        println!("  Amount:    {}", data.amount);
        println!("  Deadline:  height {}", data.deadline);
    }

    Ok(())
}

/// `confirm`, `refund`, or `close`, selected by `action`.
pub async fn settle(args: &SettleArgs, action: &str) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/channels/{}/{}", args.endpoint, args.channel, action);
    let body = CallerRequest {
        caller: &args.caller,
    };

    let client = reqwest::Client::new();
    let request = client.post(&url).json(&body);
    if let Some(data) = send::<SettleResponse>(request, &args.endpoint, action).await? {
        println!("Channel {} {}.", data.channel_id, data.status);
        println!("  Amount:    {}", data.amount);
    }

    Ok(())
}

pub async fn info(args: &InfoArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/channels/{}", args.endpoint, args.channel);
    let request = reqwest::Client::new().get(&url);
    if let Some(ch) = send::<ChannelInfo>(request, &args.endpoint, "lookup").await? {
        print_channel(&ch);
    }

    Ok(())
}

pub async fn list(args: &ListArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/accounts/{}/channels", args.endpoint, args.identity);
    let request = reqwest::Client::new().get(&url);
    if let Some(data) = send::<ChannelList>(request, &args.endpoint, "list").await? {
        println!("{} channel(s) for {}", data.count, args.identity);
        for ch in &data.channels {
            println!();
            print_channel(ch);
        }
    }

    Ok(())
}
