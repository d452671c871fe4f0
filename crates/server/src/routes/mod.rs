use axum::{
    Router,
    extract::OriginalUri,
    http::{HeaderValue, Method, Request, header, header::HeaderName},
    middleware,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, field, warn};

use crate::{AppState, auth::load_session, error::ApiError, openapi::RouteContract};

pub mod auth;
pub mod docs;
pub mod health;
pub mod tasks;

/// Every documented endpoint, in the order it appears in `/doc`.
pub fn contracts() -> Vec<RouteContract> {
    [health::CONTRACTS, tasks::CONTRACTS, auth::CONTRACTS].concat()
}

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok());
            let span = tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = field::Empty
            );
            if let Some(request_id) = request_id {
                span.record("request_id", field::display(request_id));
            }
            span
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let api = Router::<AppState>::new()
        .merge(health::router())
        .merge(tasks::router())
        .merge(auth::router())
        .merge(docs::router())
        .layer(middleware::from_fn_with_state(state.clone(), load_session));

    let base_path = state.config().base_path.clone();
    let app = if base_path.is_empty() {
        api
    } else {
        Router::<AppState>::new().nest(&base_path, api)
    };

    app.fallback(not_found)
        .layer(cors_layer(state.config().client_url.as_deref()))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeRequestUuid {},
        ))
        .with_state(state)
}

/// Restrict CORS to the frontend origin when one is configured.
fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    let Some(origin) = client_url else {
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(origin.trim_end_matches('/')) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        Err(error) => {
            warn!(?error, origin, "invalid CLIENT_URL; allowing any origin");
            CorsLayer::permissive()
        }
    }
}

async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Not Found - {}", uri.path()))
}
