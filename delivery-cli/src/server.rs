//! REST API: /api/delivery-cost, /api/weathers, /api/latest-weather and /api/weather.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use delivery_core::{DeliveryService, NewWeatherRecord, ServiceError, StoreError};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiState {
    service: DeliveryService,
}

pub fn router(service: DeliveryService, allowed_origin: &str) -> Result<Router> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{allowed_origin}'"))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let router = Router::new()
        .route("/api/delivery-cost", get(delivery_cost))
        .route("/api/weathers", get(weathers))
        .route("/api/latest-weather", get(latest_weather))
        .route("/api/weather", post(add_weather))
        .with_state(ApiState { service })
        .layer(cors);

    Ok(router)
}

pub async fn serve(listen_addr: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

/// JSON error body, `{"message": "..."}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct MessageBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageBody { message: self.message })).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(err, ServiceError::DataUnavailable(_)) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            error!(%err, "delivery cost request failed");
        }
        Self { status, message: err.to_string() }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: rejection.body_text() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: rejection.body_text() }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(%err, "weather store failure");
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
    }
}

/// Run a store-bound call off the async workers.
async fn blocking<T, F>(state: ApiState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&DeliveryService) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.service)).await.map_err(|err| {
        error!(%err, "request task failed");
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: "Internal error".into() }
    })
}

/// Missing parameters are answered like unknown names.
#[derive(Debug, Deserialize)]
struct CostQuery {
    city: Option<String>,
    vehicle: Option<String>,
}

async fn delivery_cost(
    State(state): State<ApiState>,
    query: Result<Query<CostQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(CostQuery { city, vehicle }) = query?;
    let city = city.ok_or_else(|| ServiceError::UnknownCity(String::new()))?;
    let vehicle = vehicle.unwrap_or_default();

    let cost = blocking(state, move |service| service.delivery_cost(&city, &vehicle)).await??;
    Ok(Json(cost).into_response())
}

async fn weathers(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let records = blocking(state, |service| service.weathers()).await??;
    if records.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(records).into_response())
}

#[derive(Debug, Deserialize)]
struct CityQuery {
    city: Option<String>,
}

async fn latest_weather(
    State(state): State<ApiState>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(CityQuery { city }) = query?;
    let city = city.ok_or_else(|| ServiceError::UnknownCity(String::new()))?;

    let latest = blocking(state, move |service| service.latest_weather(&city)).await??;
    match latest {
        Some(record) => Ok(Json(record).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn add_weather(
    State(state): State<ApiState>,
    body: Result<Json<NewWeatherRecord>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(record) = body?;
    let saved = blocking(state, move |service| service.add_weather(record)).await??;
    Ok((StatusCode::CREATED, Json(saved)).into_response())
}
