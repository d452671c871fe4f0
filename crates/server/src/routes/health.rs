use axum::{Json, Router, extract::State};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utils::build_info::BUILD_INFO;

use crate::{
    AppState,
    openapi::{HttpMethod, ResponseSpec, RouteContract, schema_ref},
};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IndexResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub git_commit: String,
    pub git_branch: String,
    pub build_timestamp: String,
    pub database_ready: bool,
}

pub const INDEX: RouteContract = RouteContract {
    operation_id: "index",
    method: HttpMethod::Get,
    path: "/",
    summary: "Greeting",
    tag: "Index",
    requires_session: false,
    path_params: &[],
    query: None,
    body: None,
    responses: &[ResponseSpec::json(
        200,
        "Greeting message",
        schema_ref::<IndexResponse>,
    )],
};

pub const HEALTH: RouteContract = RouteContract {
    operation_id: "health",
    method: HttpMethod::Get,
    path: "/health",
    summary: "Build metadata and database reachability",
    tag: "Index",
    requires_session: false,
    path_params: &[],
    query: None,
    body: None,
    responses: &[ResponseSpec::json(
        200,
        "Service health",
        schema_ref::<HealthResponse>,
    )],
};

pub const CONTRACTS: &[RouteContract] = &[INDEX, HEALTH];

pub fn router() -> Router<AppState> {
    let router = INDEX.bind(Router::new(), index);
    HEALTH.bind(router, health_check)
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Hello from Bunplate API!".to_string(),
    })
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ready = state.db().is_ready().await;

    Json(HealthResponse {
        status: if database_ready { "ok" } else { "degraded" }.to_string(),
        version: BUILD_INFO.version.to_string(),
        git_commit: BUILD_INFO.git_commit.to_string(),
        git_branch: BUILD_INFO.git_branch.to_string(),
        build_timestamp: BUILD_INFO.build_timestamp.to_string(),
        database_ready,
    })
}
