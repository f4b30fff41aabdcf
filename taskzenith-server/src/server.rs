//! HTTP routes of the task server.
//!
//! JSON in, JSON out. Every failure is answered with an
//! [`ErrorBody`] `{ "message": ... }` and a matching status code.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::task::JoinHandle;

use taskzenith_proto::api::{self, ErrorBody};
use taskzenith_proto::project::{NewProject, Project};
use taskzenith_proto::task::{Comment, NewComment, NewTask, Task, TaskPatch};

use crate::store::{RepoError, TaskRepository};

/// Default request body cap in bytes (64 KB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Error answered to a client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        let status = match e {
            RepoError::ProjectNotFound(_) | RepoError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            RepoError::Invalid(_) | RepoError::Patch(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status, message = %self.message, "request rejected");
        }
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;
type Repo = State<Arc<TaskRepository>>;

/// Builds the router over a shared repository.
pub fn router(repo: Arc<TaskRepository>, max_body_size: usize) -> Router {
    Router::new()
        .route(api::HEALTH_ROUTE, get(health))
        .route(api::PROJECTS_ROUTE, get(list_projects).post(create_project))
        .route(
            api::PROJECT_TASKS_ROUTE,
            get(list_project_tasks).post(create_task),
        )
        .route(api::TASKS_ROUTE, get(list_tasks))
        .route(
            api::TASK_ROUTE,
            get(get_task)
                .patch(update_task)
                .put(update_task)
                .delete(delete_task),
        )
        .route(api::TASK_COMMENTS_ROUTE, axum::routing::post(add_comment))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(repo)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_projects(State(repo): Repo) -> Json<Vec<Project>> {
    Json(repo.projects().await)
}

async fn create_project(
    State(repo): Repo,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(new) = payload?;
    let project = repo.create_project(new).await?;
    tracing::info!(project_id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_project_tasks(State(repo): Repo, Path(id): Path<String>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(repo.project_tasks(&id).await?))
}

async fn create_task(
    State(repo): Repo,
    Path(id): Path<String>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(new) = payload?;
    let task = repo.create_task(&id, new).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(State(repo): Repo) -> Json<Vec<Task>> {
    Json(repo.tasks().await)
}

async fn get_task(State(repo): Repo, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    repo.task(&id)
        .await
        .map(Json)
        .ok_or_else(|| RepoError::TaskNotFound(id).into())
}

async fn update_task(
    State(repo): Repo,
    Path(id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(patch) = payload?;
    let task = repo.update_task(&id, &patch).await?;
    tracing::info!(task_id = %task.id, status = %task.status, "task updated");
    Ok(Json(task))
}

async fn delete_task(State(repo): Repo, Path(id): Path<String>) -> ApiResult<Json<ErrorBody>> {
    repo.delete_task(&id).await?;
    tracing::info!(task_id = %id, "task deleted");
    Ok(Json(ErrorBody::new("task deleted")))
}

async fn add_comment(
    State(repo): Repo,
    Path(id): Path<String>,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Json(new) = payload?;
    let comment = repo.add_comment(&id, new).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Starts the server on `addr` and returns the bound address and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    repo: Arc<TaskRepository>,
    max_body_size: usize,
) -> Result<(SocketAddr, JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(repo, max_body_size);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}
