// handlers/public/system.rs - GET /, GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service identity and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Accesorios LUI catalog API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Storefront catalog and back-office API",
            "endpoints": {
                "auth": "/api/auth/login, /api/auth/register (public)",
                "categories": "/api/categorias[/:id] (GET public, writes require token)",
                "materials": "/api/materiales[/:id] (GET public, writes require token)",
                "products": "/api/productos[/:id] (GET public, writes require token)",
                "upload": "/api/upload (token)",
                "health": "/health (public)",
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
