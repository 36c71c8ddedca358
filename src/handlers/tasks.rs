use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    middleware::{AppJson, AppQuery, CurrentUser},
    models::{CreateTask, Task, UpdateTask},
    store::Store,
};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created successfully", body = Task),
        (status = 400, description = "Invalid task fields"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn create_task(
    State(store): State<Store>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<CreateTask>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = store.create_task(user.id, payload).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/tasks",
    params(Pagination),
    responses(
        (status = 200, description = "List the caller's tasks", body = Vec<Task>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn get_tasks(
    State(store): State<Store>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<Pagination>,
) -> Result<Json<Vec<Task>>, AppError> {
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(100);

    let tasks = store.list_tasks(user.id, skip, limit).await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Get task details", body = Task),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn get_task(
    State(store): State<Store>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    let task = store.get_task(id, user.id).await?;

    Ok(Json(task))
}

#[utoipa::path(
    put,
    path = "/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid task fields"),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn update_task(
    State(store): State<Store>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateTask>,
) -> Result<Json<Task>, AppError> {
    let task = store.update_task(id, user.id, payload).await?;

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn delete_task(
    State(store): State<Store>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    store.delete_task(id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
