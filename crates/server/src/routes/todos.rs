use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service::todo::{Todo, TodoPayload, TodoService};

use crate::errors::JsonApiError;

#[derive(Clone)]
pub struct TodoState {
    pub todos: TodoService,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Todo Not Found").into_response()
}

fn decode(payload: Result<Json<TodoPayload>, JsonRejection>) -> Result<TodoPayload, JsonApiError> {
    payload
        .map(|Json(p)| p)
        .map_err(|rejection| JsonApiError::bad_request(rejection.body_text()))
}

/// 列出所有 todo
pub async fn list_todos(State(state): State<TodoState>) -> Result<Json<Vec<Todo>>, JsonApiError> {
    state
        .todos
        .list()
        .await
        .map(Json)
        .map_err(|e| JsonApiError::from_service("GET /api/todos", e))
}

/// 创建 todo；内容为空返回 400
pub async fn create_todo(
    State(state): State<TodoState>,
    payload: Result<Json<TodoPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), JsonApiError> {
    let payload = decode(payload)?;
    let todo = state
        .todos
        .add(&payload.content)
        .await
        .map_err(|e| JsonApiError::from_service("POST /api/todos", e))?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo(
    State(state): State<TodoState>,
    Path(id): Path<String>,
    payload: Result<Json<TodoPayload>, JsonRejection>,
) -> Result<Response, JsonApiError> {
    let payload = decode(payload)?;
    match state.todos.update(&id, &payload.content).await {
        Ok(Some(todo)) => Ok(Json(todo).into_response()),
        Ok(None) => Ok(not_found()),
        Err(e) => Err(JsonApiError::from_service("PUT /api/todos/:id", e)),
    }
}

/// 切换完成状态
pub async fn toggle_todo(
    State(state): State<TodoState>,
    Path(id): Path<String>,
) -> Result<Response, JsonApiError> {
    match state.todos.toggle(&id).await {
        Ok(Some(todo)) => Ok(Json(todo).into_response()),
        Ok(None) => Ok(not_found()),
        Err(e) => Err(JsonApiError::from_service("POST /api/todos/:id", e)),
    }
}

pub async fn delete_todo(
    State(state): State<TodoState>,
    Path(id): Path<String>,
) -> Result<Response, JsonApiError> {
    match state.todos.delete(&id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(false) => Ok(not_found()),
        Err(e) => Err(JsonApiError::from_service("DELETE /api/todos/:id", e)),
    }
}

/// 删除所有已完成的 todo，返回剩余列表
pub async fn delete_completed_todos(
    State(state): State<TodoState>,
) -> Result<Json<Vec<Todo>>, JsonApiError> {
    state
        .todos
        .delete_completed()
        .await
        .map(Json)
        .map_err(|e| JsonApiError::from_service("DELETE /api/todos", e))
}
