pub mod dams;
pub mod docs;
pub mod health;
pub mod measurements;

use axum::{Router, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::import::labels;
use crate::services::rate_limit::ClientIpKeyExtractor;

/// Body of 400/500 responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of 404 responses
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBody {
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        measurements::list_measurements,
        dams::list_dam_levels,
    ),
    components(
        schemas(
            crate::services::measurements::MeasurementRow,
            dams::DamLevelResponse,
            ErrorBody,
            MessageBody,
        )
    ),
    modifiers(&KnownCodes),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "measurements", description = "Hourly air-quality measurements"),
        (name = "dams", description = "Dam water levels"),
    ),
    info(
        title = "Fukuoka API",
        description = "Air-quality measurements and dam water levels from Fukuoka open data",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

/// Lists the importer's station and measurement-type codes on the `/measurements` parameters.
struct KnownCodes;

impl Modify for KnownCodes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let Some(operation) = openapi
            .paths
            .paths
            .get_mut("/measurements")
            .and_then(|item| item.get.as_mut())
        else {
            return;
        };

        for param in operation.parameters.iter_mut().flatten() {
            let codes = match param.name.as_str() {
                "station" => labels::station_codes(),
                "type" => labels::measurement_type_codes(),
                _ => continue,
            };
            let base = param.description.take().unwrap_or_default();
            param.description = Some(format!("{base} Known values: {}.", codes.join(", ")));
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let data_routes_base = Router::new()
        .route("/measurements", get(measurements::list_measurements))
        .route("/dams", get(dams::list_dam_levels));

    let data_routes = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        data_routes_base
    } else {
        let limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_millisecond(config.rate_limit_replenish_ms)
            .burst_size(config.rate_limit_burst)
            .finish();

        match limiter {
            Some(limiter) => {
                tracing::info!(
                    replenish_ms = config.rate_limit_replenish_ms,
                    burst = config.rate_limit_burst,
                    "Rate limiting configured"
                );
                data_routes_base.layer(GovernorLayer {
                    config: Arc::new(limiter),
                })
            }
            None => {
                tracing::error!(
                    replenish_ms = config.rate_limit_replenish_ms,
                    burst = config.rate_limit_burst,
                    "Invalid rate limit settings, rate limiting disabled"
                );
                data_routes_base
            }
        }
    };

    // Health check (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    let docs_routes = Router::new()
        .route("/", get(docs::welcome))
        .route("/doc", get(docs::doc_index))
        .route("/openapi.json", get(docs::openapi_json))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .merge(data_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
