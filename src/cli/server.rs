//! HTTP server exposing each source as an authenticated GET route

use axum::{
    extract::{MatchedPath, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{bearer_credential, AuthDecision, Authenticator};
use crate::config::{AppConfig, WAREHOUSE_ROUTE};
use crate::error::{Error, Result};
use crate::graphql::GraphqlClient;
use crate::sources::{parse_date, parse_id_list, PullFilters, PullRequest, Puller, SourceKind};
use crate::types::Record;
use crate::warehouse::{ConversionJourneyQuery, WarehouseEngine};

/// Header carrying the caller's upstream API key
pub const API_KEY_HEADER: &str = "APIKey";

const REALM: &str = "Basic realm=\"insights-relay\"";

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    puller: Puller,
    warehouse: Option<Arc<WarehouseEngine>>,
    shutdown: CancellationToken,
}

impl AppState {
    /// State without a warehouse
    pub fn new(authenticator: Authenticator, puller: Puller) -> Self {
        Self {
            authenticator,
            puller,
            warehouse: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build everything the server needs from a validated config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = GraphqlClient::new(config.upstream.client_config())?;
        let puller = Puller::new(
            client,
            config.upstream.page_size,
            config.upstream.retry_policy(),
        );
        let mut state = Self::new(Authenticator::new(config.users.clone()), puller);

        if let Some(warehouse) = &config.warehouse {
            state = state.with_warehouse(WarehouseEngine::open(warehouse)?);
        }

        Ok(state)
    }

    /// Attach the conversion journey warehouse
    #[must_use]
    pub fn with_warehouse(mut self, engine: WarehouseEngine) -> Self {
        self.warehouse = Some(Arc::new(engine));
        self
    }

    /// Token cancelled when the server shuts down; in-flight pulls observe it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

/// Query parameters accepted by the data routes
#[derive(Debug, Default, Deserialize)]
struct DataParams {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
    #[serde(rename = "campaignIds")]
    campaign_ids: Option<String>,
    #[serde(rename = "trackerIds")]
    tracker_ids: Option<String>,
    #[serde(rename = "AdvertiserID")]
    advertiser_ids: Option<String>,
    granularity: Option<String>,
}

/// Error rendered as `{"error": ...}` with a status derived from its kind
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        Error::Warehouse { .. } | Error::DuckDb(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        Error::MaxRetriesExceeded { .. }
        | Error::Http(_)
        | Error::HttpStatus { .. }
        | Error::UpstreamQuery { .. }
        | Error::MalformedPage { .. }
        | Error::EmptyPage { .. }
        | Error::JsonParse(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing description; only caller mistakes are echoed back verbatim
fn public_message(err: &Error, status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => err.to_string(),
        StatusCode::BAD_GATEWAY => "upstream data source unavailable".to_string(),
        StatusCode::SERVICE_UNAVAILABLE => "server is shutting down".to_string(),
        _ => "internal server error".to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!("Request failed with {}: {}", status, self.0);
        }
        let message = public_message(&self.0, status);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn records_body(records: Vec<Record>) -> Json<Value> {
    Json(json!({
        "#records": records.len(),
        "data": records,
    }))
}

/// Build the router over `state`
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut api = Router::new();
    for kind in SourceKind::all() {
        api = api.route(
            kind.definition().route,
            get(
                move |State(state): State<Arc<AppState>>,
                      headers: HeaderMap,
                      Query(params): Query<DataParams>| async move {
                    pull_source(kind, &state, &headers, params).await
                },
            ),
        );
    }
    let api = api
        .route(WAREHOUSE_ROUTE, get(warehouse_conversion_journey))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn serve(config: AppConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let shutdown = state.shutdown_token();
    let app = router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::server(format!("Failed to bind to {addr}: {e}")))?;
    info!("Starting HTTP server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {e}");
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .map_err(|e| Error::server(e.to_string()))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    matched: MatchedPath,
    request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.authenticator.authorize(authorization, matched.as_str()) {
        AuthDecision::Granted { .. } => next.run(request).await,
        AuthDecision::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, REALM)],
            Json(json!({ "error": "Unauthorized Access" })),
        )
            .into_response(),
        AuthDecision::Forbidden { username } => {
            warn!("User '{}' denied access to {}", username, matched.as_str());
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Forbidden" })),
            )
                .into_response()
        }
    }
}

fn required_date(field: &str, value: Option<&str>) -> Result<chrono::NaiveDate> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_date(field, value),
        None => Err(Error::invalid_input(field, "is required")),
    }
}

fn optional_date(field: &str, value: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse_date(field, v))
        .transpose()
}

async fn pull_source(
    kind: SourceKind,
    state: &AppState,
    headers: &HeaderMap,
    params: DataParams,
) -> std::result::Result<Json<Value>, ApiError> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::invalid_input(API_KEY_HEADER, "header is required"))?;

    let start_date = required_date("startDate", params.start_date.as_deref())?;
    let end_date = required_date("endDate", params.end_date.as_deref())?;

    let request = PullRequest::new(kind, bearer_credential(api_key), start_date, end_date)
        .with_filters(PullFilters {
            campaign_ids: parse_id_list(params.campaign_ids.as_deref()),
            tracker_ids: parse_id_list(params.tracker_ids.as_deref()),
            granularity: params.granularity,
        });

    let output = state
        .puller
        .pull(&request, &state.shutdown.child_token())
        .await?;

    Ok(records_body(output.records))
}

async fn warehouse_conversion_journey(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DataParams>,
) -> std::result::Result<Json<Value>, ApiError> {
    let mut query = ConversionJourneyQuery::new()
        .advertiser_ids(parse_id_list(params.advertiser_ids.as_deref()));
    query.start_date = optional_date("startDate", params.start_date.as_deref())?;
    query.end_date = optional_date("endDate", params.end_date.as_deref())?;
    query.validate()?;

    let engine = state
        .warehouse
        .clone()
        .ok_or_else(|| Error::warehouse("warehouse is not configured"))?;

    let records = tokio::task::spawn_blocking(move || engine.fetch(&query))
        .await
        .map_err(|e| Error::warehouse(format!("warehouse task failed: {e}")))??;

    info!("Served {} warehouse records", records.len());
    Ok(records_body(records))
}
