use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};
use tracing::{error, instrument};

use super::repo_types::{DeleteOutcome, Project, ProjectFields, ProjectPatch};
use crate::{auth::dto::MessageResponse, error::AppError, state::AppState};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/auth/projectsCollection",
            get(list_projects).post(create_project),
        )
        .route(
            "/api/auth/projectsCollection/:id",
            put(update_project).delete(delete_project),
        )
}

#[instrument(skip(state))]
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(state.projects.list().await?))
}

#[instrument(skip(state, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<ProjectFields>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(fields) = payload?;
    state.projects.create(fields).await?;
    Ok(Json(MessageResponse::ok("Project added successfully")))
}

#[instrument(skip(state, payload))]
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProjectPatch>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(patch) = payload?;
    match state.projects.update(&id, patch).await {
        Ok(_) => Ok(Json(MessageResponse::ok("Project updated successfully"))),
        Err(e) => {
            if e.status().is_server_error() && !e.logged_on_response() {
                error!(error = %e, %id, "error updating project");
            }
            Err(e)
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    Ok(Json(state.projects.delete(&id).await?))
}
