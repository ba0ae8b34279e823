//! Issue endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::issue::{CreateIssue, Issue},
};

/// List all issue records
pub async fn list_issues(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Issue>>> {
    let issues = state.services.issues.list().await?;
    Ok(Json(issues))
}

/// Get an issue by id
pub async fn get_issue(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Issue>> {
    let issue = state.services.issues.get_by_id(id).await?;
    Ok(Json(issue))
}

/// Issue a book to a reader
pub async fn create_issue(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateIssue>,
) -> AppResult<(StatusCode, Json<Issue>)> {
    let issue = state.services.issues.issue(request).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

/// Record the return of an issued book
pub async fn return_issue(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Issue>> {
    let issue = state.services.issues.return_issue(id).await?;
    Ok(Json(issue))
}
