use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod flights;
pub mod middleware;
pub mod password;
pub mod state;
pub mod stream;

pub use error::AppError;
pub use state::{AppState, AuthConfig};

use middleware::{admin_auth_middleware, customer_auth_middleware, rate_limit_middleware};

pub fn app(state: AppState) -> Router {
    let customer = Router::new()
        .merge(auth::profile_routes())
        .merge(flights::routes())
        .merge(bookings::routes())
        .route_layer(from_fn_with_state(state.clone(), customer_auth_middleware));

    let admin = admin::routes()
        .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    let api = Router::new()
        .merge(auth::routes())
        .merge(customer)
        .merge(admin);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .layer(cors(state.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

fn cors(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin {
        Some(origin) if origin != "*" => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                AllowOrigin::any()
            }
        },
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT])
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
