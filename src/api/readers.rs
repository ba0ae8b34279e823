//! Reader endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        issue::Issue,
        reader::{CreateReader, Reader},
    },
};

/// List all readers
pub async fn list_readers(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Reader>>> {
    let readers = state.services.readers.list().await?;
    Ok(Json(readers))
}

/// Get a reader by id
pub async fn get_reader(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Reader>> {
    let reader = state.services.readers.get_by_id(id).await?;
    Ok(Json(reader))
}

/// Register a new reader
pub async fn create_reader(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateReader>,
) -> AppResult<(StatusCode, Json<Reader>)> {
    let reader = state.services.readers.create(request).await?;
    Ok((StatusCode::CREATED, Json(reader)))
}

/// Delete a reader, responding with the removed record
pub async fn delete_reader(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Reader>> {
    let reader = state.services.readers.delete(id).await?;
    Ok(Json(reader))
}

/// List all issues belonging to a reader
pub async fn list_reader_issues(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Issue>>> {
    let issues = state.services.issues.list_by_reader(id).await?;
    Ok(Json(issues))
}
