//! Task model: the to-do items exposed by the `/tasks` resource.
//!
//! Queries return `Option`/`bool` for "no such task" and reserve
//! [`TaskError`] for failures the caller cannot recover from.

mod params;
mod queries;

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

pub use params::{DEFAULT_LIMIT, ListTasksParams, MAX_LIMIT, SortOrder, TaskListQuery};

/// Maximum length of a task name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    /// Null until the task is first updated.
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct CreateTask {
    #[validate(custom(function = "validate_task_name"))]
    #[schemars(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

impl CreateTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
        }
    }
}

/// Partial update. At least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[validate(schema(function = "validate_update_not_empty"))]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_task_name"))]
    #[schemars(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.done.is_none()
    }
}

/// A page of rows plus the metadata needed to request the next one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(current_page: u32, limit: u32, total_count: u64) -> Self {
        let limit = limit.max(1);
        Self {
            current_page,
            limit,
            total_count,
            total_pages: total_count.div_ceil(u64::from(limit)),
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("At least one field must be provided for update")]
    EmptyUpdate,
    #[error("Failed to create task")]
    NotPersisted,
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) fn validate_task_name(name: &str) -> Result<(), ValidationError> {
    let length = name.chars().count();
    if length == 0 {
        return Err(ValidationError::new("length").with_message(Cow::Borrowed("Task name is required")));
    }
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::new("length").with_message(Cow::Borrowed("Task name too long")));
    }
    Ok(())
}

fn validate_update_not_empty(update: &UpdateTask) -> Result<(), ValidationError> {
    if update.is_empty() {
        return Err(ValidationError::new("empty_update").with_message(Cow::Borrowed(
            "At least one field must be provided for update",
        )));
    }
    Ok(())
}
