//! HTTP API server for the Zenith node.
//!
//! Provides REST endpoints for channel operations, the settlement address
//! registry, account balances, and chain status. Mutating requests name the
//! acting identity in a `caller` field.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use zenith_core::{Amount, BlockHeight, ChannelError, ChannelId, ChannelInfo, ErrorKind, Principal};

use crate::commands::{
    AccountResponse, ChainStatus, ChannelListResponse, CreateChannelResponse, ExecuteResponse,
    NodeCommand, RegisterResponse, SettleResponse,
};
use crate::state::NodeState;

// --- Request / response types ---

#[derive(Deserialize)]
pub struct CreateChannelRequest {
    pub caller: String,
    pub receiver: String,
    pub amount: Amount,
}

#[derive(Deserialize)]
pub struct ExecutePaymentRequest {
    pub caller: String,
    pub amount: Amount,
}

/// Body of confirm, refund, and close.
#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

#[derive(Deserialize)]
pub struct RegisterAddressRequest {
    pub caller: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct MineRequest {
    #[serde(default = "default_mine_blocks")]
    pub blocks: BlockHeight,
}

fn default_mine_blocks() -> BlockHeight {
    1
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub identity: Principal,
    pub address: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_secs: u64,
    #[serde(flatten)]
    pub chain: ChainStatus,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: None,
        }),
    )
}

/// Map a ledger error to its HTTP status and stable code.
fn channel_error(err: ChannelError) -> ApiError {
    let status = match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotAuthorized => StatusCode::FORBIDDEN,
        ErrorKind::InvalidState => StatusCode::CONFLICT,
        ErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: Some(err.code()),
        }),
    )
}

fn principal(raw: String) -> Result<Principal, ApiError> {
    Principal::new(raw).map_err(channel_error)
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(
    State(state): State<Arc<NodeState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
    let Json(chain) =
        send_command_and_await(&state, NodeCommand::Status { reply: reply_tx }, reply_rx).await?;
    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        chain,
    }))
}

async fn handle_create_channel(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<CreateChannelRequest>,
) -> Result<Json<CreateChannelResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::CreateChannel {
        caller: principal(req.caller)?,
        receiver: principal(req.receiver)?,
        amount: req.amount,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_get_channel(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
) -> Result<Json<ChannelInfo>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::GetChannel {
        channel_id: ChannelId(id),
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_execute_payment(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
    Json(req): Json<ExecutePaymentRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::ExecutePayment {
        caller: principal(req.caller)?,
        channel_id: ChannelId(id),
        amount: req.amount,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_confirm_payment(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<SettleResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::ConfirmPayment {
        caller: principal(req.caller)?,
        channel_id: ChannelId(id),
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_refund_payment(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<SettleResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::RefundPayment {
        caller: principal(req.caller)?,
        channel_id: ChannelId(id),
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_close_channel(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<SettleResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::CloseChannel {
        caller: principal(req.caller)?,
        channel_id: ChannelId(id),
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_register_address(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<RegisterAddressRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::RegisterAddress {
        caller: principal(req.caller)?,
        address: req.address,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_lookup_address(
    State(state): State<Arc<NodeState>>,
    Path(identity): Path<String>,
) -> Result<Json<AddressResponse>, ApiError> {
    let identity = principal(identity)?;
    match state.registry.lookup(&identity) {
        Some(address) => Ok(Json(AddressResponse { identity, address })),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("no settlement address registered for {identity}"),
        )),
    }
}

async fn handle_account(
    State(state): State<Arc<NodeState>>,
    Path(identity): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::GetAccount {
        who: principal(identity)?,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_account_channels(
    State(state): State<Arc<NodeState>>,
    Path(identity): Path<String>,
) -> Result<Json<ChannelListResponse>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::ChannelsFor {
        who: principal(identity)?,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_mine(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<MineRequest>,
) -> Result<Json<ChainStatus>, ApiError> {
    if !state.allow_mine {
        return Err(api_error(StatusCode::FORBIDDEN, "mining is disabled"));
    }
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::Mine {
        blocks: req.blocks,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

/// Helper to send a command and await the reply.
async fn send_command_and_await<T: Serialize>(
    state: &Arc<NodeState>,
    cmd: NodeCommand,
    reply_rx: tokio::sync::oneshot::Receiver<Result<T, ChannelError>>,
) -> Result<Json<T>, ApiError> {
    state.command_tx.send(cmd).await.map_err(|_| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "node event loop not running",
        )
    })?;

    match reply_rx.await {
        Ok(Ok(resp)) => Ok(Json(resp)),
        Ok(Err(e)) => Err(channel_error(e)),
        Err(_) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "event loop dropped the reply channel",
        )),
    }
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/channels", post(handle_create_channel))
        .route("/api/v1/channels/{id}", get(handle_get_channel))
        .route("/api/v1/channels/{id}/execute", post(handle_execute_payment))
        .route("/api/v1/channels/{id}/confirm", post(handle_confirm_payment))
        .route("/api/v1/channels/{id}/refund", post(handle_refund_payment))
        .route("/api/v1/channels/{id}/close", post(handle_close_channel))
        .route("/api/v1/btc-address", post(handle_register_address))
        .route("/api/v1/btc-address/{identity}", get(handle_lookup_address))
        .route("/api/v1/accounts/{identity}", get(handle_account))
        .route(
            "/api/v1/accounts/{identity}/channels",
            get(handle_account_channels),
        )
        .route("/api/v1/chain/mine", post(handle_mine))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
