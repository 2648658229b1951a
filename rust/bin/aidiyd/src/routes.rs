//! Route registration: module routes, system endpoints and CORS.

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use aidiy_core::now_rfc3339;

/// Build the complete router: system endpoints plus every module's routes,
/// wrapped in the CORS layer.
pub fn build_router(module_routes: Vec<(&str, Router)>, cors_origin: HeaderValue) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/version", get(version));

    for (name, router) in module_routes {
        tracing::debug!("mounting module {}", name);
        app = app.merge(router);
    }

    app.layer(middleware::from_fn_with_state(cors_origin, cors))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "OK",
        "message": "AIDIY server running",
        "timestamp": now_rfc3339(),
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "aidiyd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Answers preflight requests and stamps CORS headers on every response.
async fn cors(State(origin): State<HeaderValue>, req: Request, next: Next) -> Response {
    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    apply_cors_headers(resp.headers_mut(), origin);
    resp
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, OPTIONS"),
    );
}
