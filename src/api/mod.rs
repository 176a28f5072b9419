mod error;

use crate::access::{AccessMediator, Authenticator, Caller};
use crate::config::Config;
use crate::engine::ChargerId;
use crate::error::ServiceError;
use crate::favorites::FavoriteSet;
use crate::query::{NearQuery, NearbyCharger, QueryService};
use crate::stats::StatsCollector;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub struct ApiState {
    pub query: QueryService,
    pub access: AccessMediator,
    pub authenticator: Arc<dyn Authenticator>,
    pub stats: Arc<StatsCollector>,
    pub config: Config,
}

impl ApiState {
    async fn resolve_caller(&self, headers: &HeaderMap) -> Caller {
        self.authenticator.authenticate(bearer_token(headers)).await
    }
}

#[derive(Debug, Deserialize)]
struct SetFavoriteRequest {
    #[serde(alias = "isFavorite")]
    is_favorite: bool,
}

pub fn router(state: Arc<ApiState>) -> Router {
    let cors_enabled = state.config.server.cors;

    let app = Router::new()
        .route("/chargers", get(list_chargers))
        .route("/chargers/{id}", get(get_charger))
        .route("/charger/{id}", get(get_charger))
        .route("/near", get(chargers_near))
        .route("/favorites", get(list_favorites))
        .route("/favorites/{id}", put(set_favorite))
        .route("/ping", get(ping))
        .route("/stats", get(get_stats))
        .route("/config", get(get_config))
        .with_state(state);

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(Duration::from_secs(60 * 60));
        app.layer(cors)
    } else {
        app
    }
}

pub async fn start_api_server(state: Arc<ApiState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("API Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API Server stopped.");
    Ok(())
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn list_chargers(State(state): State<Arc<ApiState>>) -> Response {
    state.stats.inc_requests();
    Json(state.query.list()).into_response()
}

async fn get_charger(
    State(state): State<Arc<ApiState>>,
    id: Result<Path<ChargerId>, PathRejection>,
) -> Result<Response, ServiceError> {
    state.stats.inc_requests();
    state.stats.inc_lookups();

    let Path(id) = id.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;
    match state.query.get_by_id(id) {
        Ok(record) => Ok(Json(record).into_response()),
        Err(e) => {
            state.stats.inc_not_found();
            Err(e)
        }
    }
}

async fn chargers_near(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<NearQuery>, QueryRejection>,
) -> Result<Json<Vec<NearbyCharger>>, ServiceError> {
    state.stats.inc_requests();
    state.stats.inc_near_queries();

    let Query(query) = query.map_err(|e| ServiceError::InvalidCoordinate(e.body_text()))?;
    state.query.near(query).map(Json)
}

async fn list_favorites(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<FavoriteSet>, ServiceError> {
    state.stats.inc_requests();

    let caller = state.resolve_caller(&headers).await;
    state.access.favorites(&caller).await.map(Json)
}

async fn set_favorite(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    id: Result<Path<ChargerId>, PathRejection>,
    body: Result<Json<SetFavoriteRequest>, JsonRejection>,
) -> Result<Json<FavoriteSet>, ServiceError> {
    state.stats.inc_requests();

    // Identity first: anonymous callers learn nothing about payload validity.
    let caller = state.resolve_caller(&headers).await;
    state.access.authorize(&caller)?;

    let Path(id) = id.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;
    let Json(body) = body.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;

    state
        .access
        .set_favorite(&caller, id, body.is_favorite)
        .await
        .map(Json)
}

async fn ping() -> &'static str {
    "OK"
}

async fn get_stats(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.stats.get_snapshot())
}

async fn get_config(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.config.clone())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
