use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/schedule", get(handlers::schedule))
        .route(
            "/schedule/classes/:class_id/subscription_types",
            get(handlers::purchase_options),
        )
        .route("/bookings", get(handlers::bookings))
        .route("/subscriptions", get(handlers::subscriptions))
        .route("/actions", post(handlers::action))
        .with_state(state)
}
