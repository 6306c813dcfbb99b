//! HTTP API for gateway operations, status, and monitoring
//!
//! Handlers are thin glue: deserialize, look up the network, invoke the
//! operation, map the error taxonomy onto status codes.

use crate::chain::{erc20, NetworkManager};
use crate::config::ServerConfig;
use crate::error::ExecutionError;
use crate::ops::{self, format_units_string, parse_address};
use crate::tx::fees::FeeMode;
use crate::wallet::SignerResolver;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Default compute units for a standalone fee estimate.
const ESTIMATE_GAS_LIMIT: u64 = 300_000;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub networks: Arc<NetworkManager>,
    pub signers: Arc<SignerResolver>,
}

/// Run the HTTP API server
pub async fn run_server(
    config: ServerConfig,
    networks: Arc<NetworkManager>,
    signers: Arc<SignerResolver>,
) -> anyhow::Result<()> {
    let state = AppState { networks, signers };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/networks", get(get_networks))
        .route("/status", get(get_status))
        .route("/estimate-gas", get(estimate_gas))
        .route("/balances", post(get_balances))
        .route("/wrap", post(wrap_handler))
        .route("/unwrap", post(unwrap_handler))
        .route("/add-liquidity", post(add_liquidity_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Taxonomy-to-HTTP mapping at the API boundary.
fn status_for(err: &ExecutionError) -> StatusCode {
    match err {
        ExecutionError::WalletNotFound(_) => StatusCode::NOT_FOUND,
        ExecutionError::TimedOut { .. } => StatusCode::REQUEST_TIMEOUT,
        ExecutionError::NodeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ExecutionError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        // Guards, device-state failures, bad parameters, reverts: the
        // caller must change something before trying again.
        _ => StatusCode::BAD_REQUEST,
    }
}

struct ApiError(ExecutionError);

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
            indeterminate: self.0.is_indeterminate(),
        });
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize)]
struct NetworkQuery {
    network: String,
    gas_limit: Option<u64>,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_networks(State(state): State<AppState>) -> impl IntoResponse {
    Json(NetworksResponse {
        networks: state.networks.names(),
    })
}

async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<StatusResponse> {
    let network = state.networks.get(&query.network)?;
    // Degrades rather than fails: an unreachable node reports block 0.
    let current_block = network.node.block_number().await.unwrap_or(0);

    Ok(Json(StatusResponse {
        network: network.name.clone(),
        chain_id: network.config.chain_id,
        rpc_url: network.config.rpc_url.clone(),
        native_symbol: network.config.native_symbol.clone(),
        current_block,
    }))
}

async fn estimate_gas(
    State(state): State<AppState>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<EstimateGasResponse> {
    let network = state.networks.get(&query.network)?;
    let estimate = network.fees.estimate().await?;
    let gas_limit = query.gas_limit.unwrap_or(ESTIMATE_GAS_LIMIT);
    // gwei * limit / 1e9 = native units
    let gas_cost = estimate.gas_price_gwei * gas_limit as f64 / 1e9;

    Ok(Json(EstimateGasResponse {
        network: network.name.clone(),
        fee_mode: estimate.fee_mode,
        gas_price_gwei: estimate.gas_price_gwei,
        max_fee_per_gas_gwei: estimate.max_fee_per_gas_gwei,
        max_priority_fee_per_gas_gwei: estimate.max_priority_fee_per_gas_gwei,
        gas_limit,
        gas_cost,
        observed_at: estimate.observed_at,
    }))
}

#[derive(Deserialize)]
struct BalancesRequest {
    network: String,
    address: String,
    /// Restrict to these symbols; all registered tokens when omitted.
    tokens: Option<Vec<String>>,
}

async fn get_balances(
    State(state): State<AppState>,
    Json(req): Json<BalancesRequest>,
) -> ApiResult<BalancesResponse> {
    let network = state.networks.get(&req.network)?;
    let owner = parse_address(&req.address)?;

    let mut balances = HashMap::new();
    let native = network.node.balance(owner).await?;
    balances.insert(
        network.config.native_symbol.clone(),
        format_units_string(native, 18),
    );

    let tokens: Vec<_> = match &req.tokens {
        Some(symbols) => {
            let mut selected = Vec::with_capacity(symbols.len());
            for symbol in symbols {
                let token = network.tokens.get(symbol).cloned().ok_or_else(|| {
                    ExecutionError::InvalidNetwork(format!(
                        "token {} not configured on network {}",
                        symbol, network.name
                    ))
                })?;
                selected.push(token);
            }
            selected
        }
        None => network.tokens.iter().cloned().collect(),
    };

    for token in tokens {
        let value = erc20::balance_of(network.node.as_ref(), token.address, owner).await?;
        balances.insert(token.symbol.clone(), format_units_string(value, token.decimals));
    }

    Ok(Json(BalancesResponse {
        network: network.name.clone(),
        address: req.address,
        balances,
    }))
}

async fn wrap_handler(
    State(state): State<AppState>,
    Json(req): Json<ops::WrapRequest>,
) -> ApiResult<ops::WrapResponse> {
    let network = state.networks.get(&req.network)?;
    Ok(Json(
        ops::wrap(&network, &state.signers, &req.address, &req.amount).await?,
    ))
}

async fn unwrap_handler(
    State(state): State<AppState>,
    Json(req): Json<ops::UnwrapRequest>,
) -> ApiResult<ops::UnwrapResponse> {
    let network = state.networks.get(&req.network)?;
    Ok(Json(
        ops::unwrap(&network, &state.signers, &req.address, &req.amount).await?,
    ))
}

async fn add_liquidity_handler(
    State(state): State<AppState>,
    Json(req): Json<ops::AddLiquidityRequest>,
) -> ApiResult<ops::AddLiquidityResponse> {
    let network = state.networks.get(&req.network)?;
    Ok(Json(ops::add_liquidity(&network, &state.signers, req).await?))
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct NetworksResponse {
    networks: Vec<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    network: String,
    chain_id: u64,
    rpc_url: String,
    native_symbol: String,
    current_block: u64,
}

#[derive(Serialize)]
struct EstimateGasResponse {
    network: String,
    fee_mode: FeeMode,
    gas_price_gwei: f64,
    max_fee_per_gas_gwei: Option<f64>,
    max_priority_fee_per_gas_gwei: Option<f64>,
    gas_limit: u64,
    /// Total fee for `gas_limit` compute units, in native units.
    gas_cost: f64,
    observed_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct BalancesResponse {
    network: String,
    address: String,
    balances: HashMap<String, String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    indeterminate: bool,
}
