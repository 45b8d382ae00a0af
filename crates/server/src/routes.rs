pub mod accounts;
pub mod admin;
pub mod garage;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::session::session_middleware;
use crate::state::ServerState;

/// Largest accepted request body; cover uploads are the only big ones.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: shop pages, accounts, staff JSON
/// endpoints and uploaded media.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let media = ServeDir::new(state.media_dir.clone());

    let pages = Router::new()
        .route("/", get(garage::index))
        .route("/car_models/", get(garage::car_list))
        .route("/car/:id/", get(garage::car_detail))
        .route("/car/:id/cover", post(garage::car_cover_upload))
        .route("/cars/my/", get(garage::my_cars))
        .route("/car/create/", get(garage::car_create_form).post(garage::car_create))
        .route("/car/update/:id", get(garage::car_update_form).post(garage::car_update))
        .route("/car/delete/:id", get(garage::car_delete_confirm).post(garage::car_delete))
        .route("/orders/", get(garage::order_list))
        .route("/orders/my/", get(garage::my_orders))
        .route("/order/:id/", get(garage::order_detail).post(garage::order_review))
        .route("/order/create", get(garage::order_create_form).post(garage::order_create))
        .route("/order/update/:id", get(garage::order_update_form).post(garage::order_update))
        .route("/order/delete/:id", get(garage::order_delete_confirm).post(garage::order_delete));

    let accounts = Router::new()
        .route("/accounts/login/", get(accounts::login_form).post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
        .route("/accounts/register/", get(accounts::register_form).post(accounts::register));

    let admin_routes = Router::new()
        .route("/admin/car-models", get(admin::list_car_models).post(admin::create_car_model))
        .route("/admin/car-models/:id", put(admin::update_car_model).delete(admin::delete_car_model))
        .route("/admin/services", get(admin::list_services).post(admin::create_service))
        .route("/admin/services/:id", put(admin::update_service).delete(admin::delete_service))
        .route("/admin/orders/:id/status", put(admin::set_order_status))
        .route("/admin/orders/:id/entries", get(admin::list_entries).post(admin::add_entry))
        .route("/admin/order-entries/:id", delete(admin::delete_entry));

    Router::new()
        .route("/health", get(health))
        .merge(pages)
        .merge(accounts)
        .merge(admin_routes)
        .nest_service("/media", media)
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
