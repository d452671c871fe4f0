use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::get,
};
use serde_json::Value;

use super::contracts;
use crate::{AppState, openapi::openapi_document};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doc", get(openapi_json))
        .route("/reference", get(reference))
}

pub async fn openapi_json(State(state): State<AppState>) -> Json<Value> {
    Json(openapi_document(&contracts(), &state.config().base_path))
}

pub async fn reference(State(state): State<AppState>) -> Html<String> {
    let spec_url = format!("{}/doc", state.config().base_path);
    Html(format!(
        r#"<!doctype html>
<html>
  <head>
    <title>Bunplate API Reference</title>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
  </head>
  <body>
    <script id="api-reference" data-url="{spec_url}"></script>
    <script src="https://cdn.jsdelivr.net/npm/@scalar/api-reference"></script>
  </body>
</html>
"#
    ))
}
