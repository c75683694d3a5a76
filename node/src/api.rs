//! # REST + JSON-RPC + WebSocket API
//!
//! Builds the axum router that exposes the deployed contracts. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Liveness probe                       |
//! | GET    | `/status`              | Deployment summary                   |
//! | POST   | `/rpc`                 | JSON-RPC 2.0 gateway                 |
//! | GET    | `/ws`                  | WebSocket stream of committed events |
//! | GET    | `/campaigns`           | Every campaign                       |
//! | GET    | `/campaigns/:id`       | One campaign                         |
//! | GET    | `/accounts/:address`   | Native and reward balances           |
//!
//! ## Wire conventions
//!
//! - Amounts are `u128` and travel as decimal strings. Requests also accept
//!   plain JSON integers up to `u64::MAX`.
//! - Addresses are `0x`-prefixed hex.
//! - The caller of an entry point is the `from` parameter. This is a dev
//!   node: requests are not signed.
//! - A rejected call answers with code `-32000` and `data.kind` set to the
//!   error kind (`"TooEarly"`, `"NotMinter"`, ...).
//!
//! Mutating methods run one at a time behind the sequencer lock. After each
//! one, the events it produced are pushed to WebSocket subscribers.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use charity_contracts::{
    Campaign, CampaignId, CampaignStatus, CrowdfundingError, CrowdfundingEvent, TokenError,
    TokenEvent,
};
use charity_protocol::config::DEV_FAUCET_AMOUNT;
use charity_protocol::{Address, Amount, Clock, Settlement, TransferError};

use crate::bootstrap::Deployment;
use crate::metrics::SharedMetrics;

/// Code for calls the ledger or token turned away.
const EXECUTION_ERROR: i32 = -32000;
/// Code for the faucet on a non-dev network.
const FAUCET_DISABLED: i32 = -32004;

/// Methods that change state and go through the sequencer.
const MUTATING_METHODS: &[&str] = &[
    "charity_createCampaign",
    "charity_contribute",
    "charity_finalizeCampaign",
    "charity_refund",
    "token_mint",
    "token_setMinter",
    "token_transferOwnership",
    "token_renounceOwnership",
    "token_transfer",
    "token_approve",
    "token_transferFrom",
    "dev_faucet",
];

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network identifier (e.g., "devnet").
    pub network: String,
    /// The deployed contracts.
    pub deployment: Arc<Deployment>,
    /// Serializes mutating calls and remembers which events were published.
    pub sequencer: Arc<Mutex<EventCursor>>,
    /// Broadcast channel for committed events.
    pub event_tx: broadcast::Sender<NodeEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Whether `dev_faucet` is served.
    pub faucet_enabled: bool,
}

impl AppState {
    /// Builds the state for a fresh deployment. Events emitted during
    /// deployment itself are not published.
    pub fn new(
        version: String,
        network: String,
        deployment: Arc<Deployment>,
        event_tx: broadcast::Sender<NodeEvent>,
        metrics: SharedMetrics,
        faucet_enabled: bool,
    ) -> Self {
        let cursor = EventCursor {
            crowdfunding: deployment.crowdfunding.events().len(),
            token: deployment.token.events().len(),
        };
        metrics
            .campaigns
            .set(deployment.crowdfunding.campaign_count() as i64);
        Self {
            version,
            network,
            deployment,
            sequencer: Arc::new(Mutex::new(cursor)),
            event_tx,
            metrics,
            faucet_enabled,
        }
    }
}

/// How far into each contract's event log we have published.
#[derive(Debug, Default)]
pub struct EventCursor {
    crowdfunding: usize,
    token: usize,
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", content = "event", rename_all = "snake_case")]
pub enum NodeEvent {
    /// Emitted by the crowdfunding service.
    Crowdfunding(CrowdfundingEvent),
    /// Emitted by the reward token.
    Token(TokenEvent),
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .route("/campaigns", get(campaigns_handler))
        .route("/campaigns/:id", get(campaign_handler))
        .route("/accounts/:address", get(account_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Named method parameters.
    pub params: Option<Value>,
    /// Request identifier. Echoed back in the response.
    pub id: Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Structured error data; `{"kind": ...}` for rejected calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    fn invalid_params(message: impl std::fmt::Display) -> Self {
        Self {
            code: -32602,
            message: format!("Invalid params: {}", message),
            data: None,
        }
    }

    fn internal(message: impl std::fmt::Display) -> Self {
        Self {
            code: -32603,
            message: format!("Internal error: {}", message),
            data: None,
        }
    }

    fn rejected(kind: &str, message: String) -> Self {
        Self {
            code: EXECUTION_ERROR,
            message,
            data: Some(json!({ "kind": kind })),
        }
    }

    /// The error kind of a rejected call.
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

impl From<CrowdfundingError> for JsonRpcError {
    fn from(err: CrowdfundingError) -> Self {
        let mut error = Self::rejected(err.kind(), err.to_string());
        if let Some(data) = error.data.as_mut() {
            data["class"] = json!(format!("{:?}", err.class()));
        }
        error
    }
}

impl From<TokenError> for JsonRpcError {
    fn from(err: TokenError) -> Self {
        Self::rejected(err.kind(), err.to_string())
    }
}

impl From<TransferError> for JsonRpcError {
    fn from(err: TransferError) -> Self {
        Self::rejected(err.kind(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// A `u128` amount, given as a decimal string or a JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "QuantityRepr")]
pub struct Quantity(pub Amount);

#[derive(Deserialize)]
#[serde(untagged)]
enum QuantityRepr {
    Text(String),
    Number(u64),
}

impl TryFrom<QuantityRepr> for Quantity {
    type Error = String;

    fn try_from(repr: QuantityRepr) -> Result<Self, Self::Error> {
        match repr {
            QuantityRepr::Number(n) => Ok(Quantity(Amount::from(n))),
            QuantityRepr::Text(s) => s
                .trim()
                .parse::<Amount>()
                .map(Quantity)
                .map_err(|e| format!("invalid amount {:?}: {}", s, e)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCampaignParams {
    from: Address,
    title: String,
    goal: Quantity,
    duration: u64,
    beneficiary: Address,
}

#[derive(Debug, Deserialize)]
struct ContributeParams {
    from: Address,
    id: CampaignId,
    amount: Quantity,
}

#[derive(Debug, Deserialize)]
struct CampaignParams {
    id: CampaignId,
}

#[derive(Debug, Deserialize)]
struct RefundParams {
    from: Address,
    id: CampaignId,
}

#[derive(Debug, Deserialize)]
struct ContributionParams {
    id: CampaignId,
    contributor: Address,
}

#[derive(Debug, Deserialize)]
struct AccountParams {
    account: Address,
}

#[derive(Debug, Deserialize)]
struct AllowanceParams {
    owner: Address,
    spender: Address,
}

#[derive(Debug, Deserialize)]
struct CallerParams {
    from: Address,
}

#[derive(Debug, Deserialize)]
struct MintParams {
    from: Address,
    to: Address,
    amount: Quantity,
}

#[derive(Debug, Deserialize)]
struct SetMinterParams {
    from: Address,
    minter: Address,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferOwnershipParams {
    from: Address,
    new_owner: Address,
}

#[derive(Debug, Deserialize)]
struct TransferParams {
    from: Address,
    to: Address,
    value: Quantity,
}

#[derive(Debug, Deserialize)]
struct ApproveParams {
    from: Address,
    spender: Address,
    value: Quantity,
}

#[derive(Debug, Deserialize)]
struct TransferFromParams {
    from: Address,
    owner: Address,
    to: Address,
    value: Quantity,
}

fn parse<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(JsonRpcError::invalid_params)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Network identifier.
    pub network: String,
    /// Crowdfunding service address.
    pub crowdfunding: Address,
    /// Reward token address.
    pub reward_token: Address,
    /// Reward units per contributed unit.
    pub reward_rate: String,
    /// Campaigns created so far.
    pub campaign_count: u64,
    /// Whether the dev faucet is served.
    pub faucet_enabled: bool,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// A campaign as served over the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct CampaignView {
    pub id: CampaignId,
    pub title: String,
    pub goal: String,
    pub deadline: u64,
    pub creator: Address,
    pub beneficiary: Address,
    pub total_raised: String,
    pub finalized: bool,
    pub successful: bool,
    pub phase: String,
    pub active: bool,
    pub ended: bool,
}

impl CampaignView {
    fn new(campaign: &Campaign, status: CampaignStatus) -> Self {
        Self {
            id: campaign.id,
            title: campaign.title.clone(),
            goal: campaign.goal.to_string(),
            deadline: campaign.deadline,
            creator: campaign.creator,
            beneficiary: campaign.beneficiary,
            total_raised: campaign.total_raised.to_string(),
            finalized: campaign.finalized,
            successful: campaign.successful,
            phase: campaign.phase().to_string(),
            active: status.active,
            ended: status.ended,
        }
    }
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    /// The account.
    pub address: Address,
    /// Native value held.
    pub native_balance: String,
    /// Reward token balance.
    pub reward_balance: String,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn to_json<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(JsonRpcError::internal)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// `GET /status`: deployment summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cf = &state.deployment.crowdfunding;
    Json(StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        crowdfunding: cf.address(),
        reward_token: state.deployment.token.address(),
        reward_rate: cf.reward_rate().to_string(),
        campaign_count: cf.campaign_count(),
        faucet_enabled: state.faucet_enabled,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `POST /rpc`: JSON-RPC 2.0 gateway.
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError::invalid_request(
                "Invalid Request: jsonrpc must be \"2.0\"",
            )),
            id: req.id,
        });
    }

    let (result, error) = match dispatch(&state, &req.method, req.params).await {
        Ok(value) => (Some(value), None),
        Err(err) => {
            if let Some(kind) = err.kind() {
                state.metrics.record_rejection(kind);
                tracing::debug!(method = %req.method, kind, "call rejected");
            }
            (None, Some(err))
        }
    };

    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

/// Routes a method to its read or sequenced write implementation.
async fn dispatch(
    state: &AppState,
    method: &str,
    params: Option<Value>,
) -> Result<Value, JsonRpcError> {
    if MUTATING_METHODS.contains(&method) {
        return sequenced(state, method, params).await;
    }

    let d = &state.deployment;
    let cf = &d.crowdfunding;
    let token = &d.token;

    match method {
        "charity_version" => Ok(json!(state.version)),
        "charity_campaignCount" => Ok(json!(cf.campaign_count())),
        "charity_rewardRate" => Ok(json!(cf.reward_rate().to_string())),
        "charity_rewardToken" => to_json(token.address()),
        "charity_address" => to_json(cf.address()),
        "charity_getCampaign" => {
            let p: CampaignParams = parse(params)?;
            let campaign = cf.campaign(p.id)?;
            let status = cf.status(p.id)?;
            to_json(CampaignView::new(&campaign, status))
        }
        "charity_getCampaignStatus" => {
            let p: CampaignParams = parse(params)?;
            to_json(cf.status(p.id)?)
        }
        "charity_contributions" => {
            let p: ContributionParams = parse(params)?;
            Ok(json!(cf.contributions(p.id, &p.contributor).to_string()))
        }
        "token_name" => Ok(json!(token.name())),
        "token_symbol" => Ok(json!(token.symbol())),
        "token_decimals" => Ok(json!(token.decimals())),
        "token_totalSupply" => Ok(json!(token.total_supply().to_string())),
        "token_owner" => to_json(token.owner()),
        "token_minter" => to_json(token.minter()),
        "token_balanceOf" => {
            let p: AccountParams = parse(params)?;
            Ok(json!(token.balance_of(&p.account).to_string()))
        }
        "token_allowance" => {
            let p: AllowanceParams = parse(params)?;
            Ok(json!(token.allowance(&p.owner, &p.spender).to_string()))
        }
        "native_balanceOf" => {
            let p: AccountParams = parse(params)?;
            Ok(json!(d.bank.balance_of(&p.account).to_string()))
        }
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

/// Runs one mutating call under the sequencer lock, then publishes the
/// events it produced.
async fn sequenced(
    state: &AppState,
    method: &str,
    params: Option<Value>,
) -> Result<Value, JsonRpcError> {
    let started = Instant::now();
    let mut cursor = state.sequencer.lock().await;

    let result = apply(state, method, params);

    publish_events(state, &mut cursor);
    drop(cursor);
    state
        .metrics
        .call_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    result
}

fn apply(state: &AppState, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
    let d = &state.deployment;
    let cf = &d.crowdfunding;
    let token = &d.token;
    let metrics = &state.metrics;

    match method {
        "charity_createCampaign" => {
            let p: CreateCampaignParams = parse(params)?;
            let id = cf.create_campaign(&p.from, p.title, p.goal.0, p.duration, &p.beneficiary)?;
            metrics.campaigns_created_total.inc();
            metrics.campaigns.set(cf.campaign_count() as i64);
            Ok(json!(id))
        }
        "charity_contribute" => {
            let p: ContributeParams = parse(params)?;
            contribute_with_value(d, &p.from, p.id, p.amount.0)?;
            metrics.contributions_total.inc();
            Ok(Value::Null)
        }
        "charity_finalizeCampaign" => {
            let p: CampaignParams = parse(params)?;
            cf.finalize_campaign(p.id)?;
            let successful = cf.campaign(p.id)?.successful;
            let outcome = if successful { "successful" } else { "failed" };
            metrics.finalizations_total.with_label_values(&[outcome]).inc();
            Ok(json!({ "successful": successful }))
        }
        "charity_refund" => {
            let p: RefundParams = parse(params)?;
            cf.refund(&p.from, p.id)?;
            metrics.refunds_total.inc();
            Ok(Value::Null)
        }
        "token_mint" => {
            let p: MintParams = parse(params)?;
            token.mint(&p.from, &p.to, p.amount.0)?;
            Ok(Value::Null)
        }
        "token_setMinter" => {
            let p: SetMinterParams = parse(params)?;
            token.set_minter(&p.from, &p.minter)?;
            Ok(Value::Null)
        }
        "token_transferOwnership" => {
            let p: TransferOwnershipParams = parse(params)?;
            token.transfer_ownership(&p.from, &p.new_owner)?;
            Ok(Value::Null)
        }
        "token_renounceOwnership" => {
            let p: CallerParams = parse(params)?;
            token.renounce_ownership(&p.from)?;
            Ok(Value::Null)
        }
        "token_transfer" => {
            let p: TransferParams = parse(params)?;
            token.transfer(&p.from, &p.to, p.value.0)?;
            Ok(json!(true))
        }
        "token_approve" => {
            let p: ApproveParams = parse(params)?;
            token.approve(&p.from, &p.spender, p.value.0)?;
            Ok(json!(true))
        }
        "token_transferFrom" => {
            let p: TransferFromParams = parse(params)?;
            token.transfer_from(&p.from, &p.owner, &p.to, p.value.0)?;
            Ok(json!(true))
        }
        "dev_faucet" => {
            if !state.faucet_enabled {
                return Err(JsonRpcError {
                    code: FAUCET_DISABLED,
                    message: format!("faucet is not available on {}", state.network),
                    data: None,
                });
            }
            let p: AccountParams = parse(params)?;
            let balance = d.bank.credit(&p.account, DEV_FAUCET_AMOUNT)?;
            tracing::info!(account = %p.account, amount = %DEV_FAUCET_AMOUNT, "faucet credited");
            Ok(json!(balance.to_string()))
        }
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

/// Attaches `amount` of native value to a contribution: the value moves
/// into escrow first and comes back if the ledger rejects the pledge.
///
/// The escrow account cannot pledge. Its transfer to itself moves nothing,
/// so the pledge would be backed by other contributors' funds.
fn contribute_with_value(
    d: &Deployment,
    contributor: &Address,
    id: CampaignId,
    amount: Amount,
) -> Result<(), JsonRpcError> {
    let escrow = d.crowdfunding.address();
    if *contributor == escrow {
        return Err(JsonRpcError::rejected(
            "InvalidContributor",
            format!("escrow account {} cannot contribute", escrow),
        ));
    }
    d.bank.transfer(contributor, &escrow, amount)?;

    if let Err(err) = d.crowdfunding.contribute(contributor, id, amount) {
        if let Err(reversal) = d.bank.transfer(&escrow, contributor, amount) {
            tracing::error!(
                %contributor,
                amount = %amount,
                error = %reversal,
                "failed to return attached value"
            );
        }
        return Err(err.into());
    }
    Ok(())
}

/// Forwards events appended since the last call to subscribers.
fn publish_events(state: &AppState, cursor: &mut EventCursor) {
    let token_events = state.deployment.token.events_since(cursor.token);
    cursor.token += token_events.len();
    let cf_events = state.deployment.crowdfunding.events_since(cursor.crowdfunding);
    cursor.crowdfunding += cf_events.len();

    let events = token_events
        .into_iter()
        .map(NodeEvent::Token)
        .chain(cf_events.into_iter().map(NodeEvent::Crowdfunding));
    for event in events {
        // No subscribers is fine.
        let _ = state.event_tx.send(event);
    }
}

/// `GET /ws`: WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`NodeEvent`] messages. Client messages are
/// ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

/// `GET /campaigns`: every campaign, in id order.
async fn campaigns_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.deployment.clock.now();
    let views: Vec<CampaignView> = state
        .deployment
        .crowdfunding
        .campaigns()
        .iter()
        .map(|c| CampaignView::new(c, c.status(now)))
        .collect();
    Json(views)
}

/// `GET /campaigns/:id`: one campaign, or 404.
async fn campaign_handler(
    Path(id): Path<CampaignId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let now = state.deployment.clock.now();
    match state.deployment.crowdfunding.campaign(id) {
        Ok(campaign) => {
            (StatusCode::OK, Json(CampaignView::new(&campaign, campaign.status(now)))).into_response()
        }
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// `GET /accounts/:address`: native and reward balances.
///
/// Unknown accounts report zero balances.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let address: Address = match address.parse() {
        Ok(a) => a,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("{}", e),
                }),
            )
                .into_response();
        }
    };

    let d = &state.deployment;
    Json(AccountResponse {
        address,
        native_balance: d.bank.balance_of(&address).to_string(),
        reward_balance: d.token.balance_of(&address).to_string(),
    })
    .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
