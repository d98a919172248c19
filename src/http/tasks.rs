//! Task endpoints.
//!
//! | Method | Path                  | Success             |
//! |--------|-----------------------|---------------------|
//! | GET    | `/tasks?title=&description=` | 200, task list |
//! | POST   | `/tasks`              | 201, created task   |
//! | PUT    | `/tasks/:id`          | 204                 |
//! | PATCH  | `/tasks/:id/complete` | 204                 |
//! | DELETE | `/tasks/:id`          | 204                 |

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::Response;
use uuid::Uuid;

use crate::http::response::{self, ApiError};
use crate::routing::{PatternError, RequestContext, Router};
use crate::store::{DocumentStore, Filter, NewRecord, RecordPatch};

/// Dispatcher state shared by the task handlers.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub store: Arc<DocumentStore>,
    pub table: Arc<str>,
}

impl TaskState {
    pub fn new(store: Arc<DocumentStore>, table: &str) -> Self {
        Self {
            store,
            table: Arc::from(table),
        }
    }
}

/// The task route table, in dispatch order.
pub fn task_routes() -> Result<Router<TaskState>, PatternError> {
    let mut router = Router::new();
    router
        .route(Method::GET, "/tasks?", list_tasks)?
        .route(Method::POST, "/tasks", create_task)?
        .route(Method::PUT, "/tasks/:id", update_task)?
        .route(Method::PATCH, "/tasks/:id/complete", complete_task)?
        .route(Method::DELETE, "/tasks/:id", delete_task)?;
    Ok(router)
}

pub async fn list_tasks(state: TaskState, ctx: RequestContext) -> Response {
    let filter = Filter {
        title: ctx.query_value("title").map(str::to_string),
        description: ctx.query_value("description").map(str::to_string),
    };

    let tasks = if filter.is_empty() {
        state.store.find_all(&state.table)
    } else {
        state.store.find_by_filter(&state.table, &filter)
    };

    response::json(StatusCode::OK, &tasks)
}

pub async fn create_task(state: TaskState, ctx: RequestContext) -> Result<Response, ApiError> {
    let (Some(title), Some(description)) = (ctx.text_field("title"), ctx.text_field("description")) else {
        return Err(ApiError::Validation("Title and description are required"));
    };

    let task = state
        .store
        .create(&state.table, NewRecord::new(title, description))
        .await?;

    tracing::info!(id = %task.id, table = %state.table, "Task created");
    Ok(response::json(StatusCode::CREATED, &task))
}

pub async fn update_task(state: TaskState, ctx: RequestContext) -> Result<Response, ApiError> {
    let patch = RecordPatch {
        title: ctx.text_field("title").map(str::to_string),
        description: ctx.text_field("description").map(str::to_string),
    };
    if patch.is_empty() {
        return Err(ApiError::Validation("Title or description is required"));
    }

    let id = task_id(&ctx)?;
    state.store.update(&state.table, id, patch).await?;

    tracing::info!(id = %id, table = %state.table, "Task updated");
    Ok(response::no_content())
}

pub async fn complete_task(state: TaskState, ctx: RequestContext) -> Result<Response, ApiError> {
    let id = task_id(&ctx)?;
    let task = state.store.toggle_completion(&state.table, id).await?;

    tracing::info!(id = %id, completed = task.is_completed(), "Task completion toggled");
    Ok(response::no_content())
}

pub async fn delete_task(state: TaskState, ctx: RequestContext) -> Result<Response, ApiError> {
    let id = task_id(&ctx)?;
    state.store.delete(&state.table, id).await?;

    tracing::info!(id = %id, table = %state.table, "Task deleted");
    Ok(response::no_content())
}

/// Ids that are not UUIDs cannot exist in the store.
fn task_id(ctx: &RequestContext) -> Result<Uuid, ApiError> {
    let raw = ctx.param("id").unwrap_or_default();
    Uuid::parse_str(raw).map_err(|_| {
        tracing::debug!(id = %raw, "Task id is not a UUID");
        ApiError::NotFound
    })
}
