use axum::{Json, Router, extract::State, http::StatusCode};
use db::models::task::{CreateTask, ListTasksParams, Paginated, Task, UpdateTask};
use tracing::instrument;

use crate::{
    AppState,
    auth::RequireSession,
    error::{ApiError, ErrorMessage},
    extract::{QueryParams, TaskId, ValidJson},
    openapi::{
        HttpMethod, PathParam, ResponseSpec, RouteContract, schema_inline, schema_ref,
    },
};

const TAG: &str = "Tasks";

const TASK_ID: &[PathParam] = &[PathParam {
    name: "id",
    description: "Task id",
}];

const UNAUTHORIZED: ResponseSpec =
    ResponseSpec::json(401, "No active session", schema_ref::<ErrorMessage>);
const NOT_FOUND: ResponseSpec =
    ResponseSpec::json(404, "Task not found", schema_ref::<ErrorMessage>);
const UNPROCESSABLE: ResponseSpec =
    ResponseSpec::json(422, "Invalid id or request body", schema_ref::<ErrorMessage>);
const SERVER_ERROR: ResponseSpec =
    ResponseSpec::json(500, "Store failure", schema_ref::<ErrorMessage>);

pub const LIST_TASKS: RouteContract = RouteContract {
    operation_id: "listTasks",
    method: HttpMethod::Get,
    path: "/tasks",
    summary: "List tasks, one page at a time",
    tag: TAG,
    requires_session: false,
    path_params: &[],
    query: Some(schema_inline::<ListTasksParams>),
    body: None,
    responses: &[
        ResponseSpec::json(200, "A page of tasks", schema_ref::<Paginated<Task>>),
        SERVER_ERROR,
    ],
};

pub const CREATE_TASK: RouteContract = RouteContract {
    operation_id: "createTask",
    method: HttpMethod::Post,
    path: "/tasks",
    summary: "Create a task",
    tag: TAG,
    requires_session: true,
    path_params: &[],
    query: None,
    body: Some(schema_ref::<CreateTask>),
    responses: &[
        ResponseSpec::json(201, "The created task", schema_ref::<Task>),
        UNAUTHORIZED,
        UNPROCESSABLE,
        SERVER_ERROR,
    ],
};

pub const GET_TASK: RouteContract = RouteContract {
    operation_id: "getTask",
    method: HttpMethod::Get,
    path: "/tasks/{id}",
    summary: "Fetch one task",
    tag: TAG,
    requires_session: false,
    path_params: TASK_ID,
    query: None,
    body: None,
    responses: &[
        ResponseSpec::json(200, "The requested task", schema_ref::<Task>),
        NOT_FOUND,
        UNPROCESSABLE,
        SERVER_ERROR,
    ],
};

pub const UPDATE_TASK: RouteContract = RouteContract {
    operation_id: "updateTask",
    method: HttpMethod::Patch,
    path: "/tasks/{id}",
    summary: "Update a task's name and/or done flag",
    tag: TAG,
    requires_session: true,
    path_params: TASK_ID,
    query: None,
    body: Some(schema_ref::<UpdateTask>),
    responses: &[
        ResponseSpec::json(200, "The updated task", schema_ref::<Task>),
        UNAUTHORIZED,
        NOT_FOUND,
        UNPROCESSABLE,
        SERVER_ERROR,
    ],
};

pub const DELETE_TASK: RouteContract = RouteContract {
    operation_id: "deleteTask",
    method: HttpMethod::Delete,
    path: "/tasks/{id}",
    summary: "Delete a task",
    tag: TAG,
    requires_session: true,
    path_params: TASK_ID,
    query: None,
    body: None,
    responses: &[
        ResponseSpec::empty(204, "Task deleted"),
        UNAUTHORIZED,
        NOT_FOUND,
        UNPROCESSABLE,
        SERVER_ERROR,
    ],
};

pub const CONTRACTS: &[RouteContract] =
    &[LIST_TASKS, CREATE_TASK, GET_TASK, UPDATE_TASK, DELETE_TASK];

pub fn router() -> Router<AppState> {
    let router = Router::new();
    let router = LIST_TASKS.bind(router, list_tasks);
    let router = CREATE_TASK.bind(router, create_task);
    let router = GET_TASK.bind(router, get_task);
    let router = UPDATE_TASK.bind(router, update_task);
    DELETE_TASK.bind(router, delete_task)
}

#[instrument(name = "tasks.list", skip(state, params))]
pub async fn list_tasks(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListTasksParams>,
) -> Result<Json<Paginated<Task>>, ApiError> {
    let query = params.normalize();
    let page = Task::find_page(state.pool(), &query).await?;
    Ok(Json(page))
}

#[instrument(
    name = "tasks.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user.id)
)]
pub async fn create_task(
    State(state): State<AppState>,
    RequireSession(ctx): RequireSession,
    ValidJson(payload): ValidJson<CreateTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = Task::create(state.pool(), &payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(name = "tasks.get", skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<Json<Task>, ApiError> {
    Task::find_by_id(state.pool(), id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

#[instrument(
    name = "tasks.update",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user.id)
)]
pub async fn update_task(
    State(state): State<AppState>,
    RequireSession(ctx): RequireSession,
    TaskId(id): TaskId,
    ValidJson(payload): ValidJson<UpdateTask>,
) -> Result<Json<Task>, ApiError> {
    Task::update(state.pool(), id, &payload)
        .await?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

#[instrument(
    name = "tasks.delete",
    skip(state, ctx),
    fields(user_id = %ctx.user.id)
)]
pub async fn delete_task(
    State(state): State<AppState>,
    RequireSession(ctx): RequireSession,
    TaskId(id): TaskId,
) -> Result<StatusCode, ApiError> {
    if Task::delete(state.pool(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::task_not_found())
    }
}
