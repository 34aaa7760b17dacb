use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use weather_core::{WeatherError, WeatherObservation, WeatherQuery, WeatherService};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WeatherService>,
}

/// Query string of `GET /weather`.
#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub location: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// Error body is the plain-text message. Only malformed input is a 400.
pub struct ApiError(WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.0.to_string()).into_response()
    }
}

/// GET /weather?location=..  or  /weather?lat=..&lon=..
async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherObservation>, ApiError> {
    let query = WeatherQuery::from_params(
        params.location.as_deref(),
        params.lat.as_deref(),
        params.lon.as_deref(),
    )?;

    let observation = state.service.lookup(&query).await?;
    Ok(Json(observation))
}

/// GET /health
async fn health_check() -> &'static str {
    "ok"
}

/// Create the HTTP router
pub fn create_router(service: Arc<WeatherService>) -> Router {
    let state = AppState { service };

    // Browser front-ends call this from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::HEAD])
        .allow_headers(Any);

    Router::new()
        .route("/weather", get(get_weather))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, service: Arc<WeatherService>) -> anyhow::Result<()> {
    let app = create_router(service);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Bind `addr` and run the HTTP server
pub async fn run_http_server(addr: &str, service: Arc<WeatherService>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server is running on {}", listener.local_addr()?);

    serve(listener, service).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
