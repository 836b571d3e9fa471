mod events;
mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn groups_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/groups", post(handlers::create_group))
        .route("/groups/join", post(handlers::join_group))
        .route(
            "/groups/{id}",
            get(handlers::get_group).patch(handlers::rename_group),
        )
        .route("/groups/{id}/events", get(events::group_events))
}
