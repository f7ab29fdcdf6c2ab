use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::{self, SecurityConfig};
use crate::database::DatabaseManager;
use crate::handlers::{elevated, protected};
use crate::middleware::{jwt_auth_middleware, require_root_middleware};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let config = config::config();

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected + elevated API
        .nest("/api", impersonate_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(&config.security));

    let router = if config.api.enable_request_logging {
        router.layer(trace_layer())
    } else {
        router
    };

    router.with_state(state)
}

type RequestSpan = fn(&Request<Body>) -> Span;

/// Request spans carry the path only; the query string may hold an
/// impersonation token
fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http().make_span_with(request_span as RequestSpan)
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

fn impersonate_routes(state: AppState) -> Router<AppState> {
    let elevated = Router::new()
        .route("/impersonate/businesses", get(elevated::impersonate_businesses))
        .route("/impersonate/:target_id", post(elevated::impersonate_begin))
        .route_layer(middleware::from_fn(require_root_middleware));

    let protected = Router::new()
        .route("/impersonate/revert", post(protected::impersonate_revert))
        .route("/impersonate/status", get(protected::impersonate_status));

    // JWT layer wraps both groups, so it runs before the root check
    elevated
        .merge(protected)
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if crate::is_development!() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Superuser API",
            "version": version,
            "description": "Platform administration for the multi-tenant POS back office",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "impersonate": "POST /api/impersonate/:target_id, GET /api/impersonate/businesses (platform admin)",
                "impersonate_session": "POST /api/impersonate/revert, GET /api/impersonate/status (authenticated)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(pool) = state.pool.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "disabled"
                }
            })),
        );
    };

    match DatabaseManager::health_check(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
