use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::groups;
use crate::server::AppState;
use crate::server::dto::GroupNameRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::types::Group;

fn load_group(state: &AppState, id: &str) -> Result<Group, ApiError> {
    groups::get(state.store.as_ref(), id)?.ok_or_else(|| ApiError::not_found("Group not found"))
}

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GroupNameRequest>,
) -> impl IntoResponse {
    let id = groups::create(state.store.as_ref(), &req.name)?;
    let group = load_group(&state, &id)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(group))))
}

pub async fn join_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GroupNameRequest>,
) -> impl IntoResponse {
    let id = groups::join(state.store.as_ref(), &req.name).map_err(|e| match e {
        crate::error::Error::NotFound => ApiError::not_found("No group with that name"),
        other => other.into(),
    })?;
    let group = load_group(&state, &id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(group)))
}

pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let group = load_group(&state, &id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(group)))
}

pub async fn rename_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<GroupNameRequest>,
) -> impl IntoResponse {
    let group = groups::rename(state.store.as_ref(), &id, &req.name)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(group)))
}
