use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::state::AppState;

/// Full HTTP surface. Reads and writes share paths; handlers that need a
/// session enforce it through the `AuthUser` extractor.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    let router = Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_routes())
        .merge(category_routes())
        .merge(material_routes())
        .merge(product_routes())
        .merge(upload_routes(state.config.upload.max_request_bytes))
        .layer(TraceLayer::new_for_http());

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/categorias",
            get(public::categories::list).post(protected::categories::post),
        )
        .route(
            "/api/categorias/:id",
            get(public::categories::get)
                .put(protected::categories::put)
                .delete(protected::categories::delete),
        )
}

fn material_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/materiales",
            get(public::materials::list).post(protected::materials::post),
        )
        .route(
            "/api/materiales/:id",
            get(public::materials::get)
                .put(protected::materials::put)
                .delete(protected::materials::delete),
        )
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/productos",
            get(public::products::list).post(protected::products::post),
        )
        .route(
            "/api/productos/:id",
            get(public::products::get)
                .put(protected::products::put)
                .delete(protected::products::delete),
        )
}

/// The body limit sits above the per-file cap so oversized images reach the
/// explicit size check and get a JSON 400.
fn upload_routes(max_request_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/api/upload",
        post(protected::upload::post).layer(DefaultBodyLimit::max(max_request_bytes)),
    )
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    Some(layer.allow_origin(origins))
}
