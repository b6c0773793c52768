use axum::{Json, extract::State, response::Html};
use serde_json::{Value, json};
use utoipa::OpenApi;

use super::ApiDoc;
use crate::common::AppState;

/// Landing page pointing at the interactive docs.
pub async fn welcome(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<html>
  <head>
    <title>Fukuoka API</title>
  </head>
  <body>
    <h1>Welcome to the Fukuoka API!</h1>
    <p>Check out the <a href="{base}/docs" target="_blank" rel="noopener noreferrer">API documentation</a>.</p>
  </body>
</html>"#,
        base = state.config.api_base_url
    ))
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Plain endpoint index
pub async fn doc_index() -> Json<Value> {
    Json(json!({
        "message": "Fukuoka Air Quality and Dam Levels API",
        "endpoints": [
            { "path": "/measurements", "methods": ["GET"] },
            { "path": "/dams", "methods": ["GET"] },
            { "path": "/docs", "description": "Interactive API documentation" },
            { "path": "/openapi.json", "description": "OpenAPI document" },
            { "path": "/healthz", "description": "Health check endpoint" },
        ],
    }))
}
