//! CRUD query operations for tasks.

use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use super::{CreateTask, PageMeta, Paginated, Task, TaskError, TaskListQuery, UpdateTask};

const TASK_COLUMNS: &str = "id, name, done, created_at, updated_at";

/// `$1 IS NULL` keeps the filter optional with a single statement shape.
/// SQLite folds only ASCII in `LIKE`, so matching runs on `name_folded`,
/// which holds `name.to_lowercase()`.
const SEARCH_FILTER: &str = r"($1 IS NULL OR name_folded LIKE $1 ESCAPE '\')";

/// Wrap a search term for `LIKE`, escaping its own wildcards so it matches literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Task {
    /// One page of tasks plus the total number of matches.
    ///
    /// The page read and the count run concurrently on separate connections.
    pub async fn find_page(
        pool: &SqlitePool,
        query: &TaskListQuery,
    ) -> Result<Paginated<Task>, TaskError> {
        let pattern = query
            .search
            .as_deref()
            .map(|search| like_pattern(&search.to_lowercase()));
        let order = query.sort.as_sql();

        let rows_sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE {SEARCH_FILTER} \
             ORDER BY created_at {order}, id {order} LIMIT $2 OFFSET $3"
        );
        let count_sql = format!("SELECT COUNT(*) FROM tasks WHERE {SEARCH_FILTER}");

        let rows = sqlx::query_as::<_, Task>(&rows_sql)
            .bind(pattern.as_deref())
            .bind(i64::from(query.limit))
            .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .fetch_all(pool);
        let count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(pool);

        let (data, total_count) = tokio::try_join!(rows, count)?;

        Ok(Paginated {
            data,
            meta: PageMeta::new(
                query.page,
                query.limit,
                u64::try_from(total_count).unwrap_or(0),
            ),
        })
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Task>, TaskError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    pub async fn create(pool: &SqlitePool, data: &CreateTask) -> Result<Task, TaskError> {
        data.validate()?;

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (name, name_folded, done, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(data.name.to_lowercase())
        .bind(data.done)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        task.ok_or(TaskError::NotPersisted)
    }

    /// Apply a partial update. `Ok(None)` when no task has this id.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateTask,
    ) -> Result<Option<Task>, TaskError> {
        if data.is_empty() {
            return Err(TaskError::EmptyUpdate);
        }
        data.validate()?;

        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks \
                SET name        = COALESCE($2, name), \
                    name_folded = COALESCE($3, name_folded), \
                    done        = COALESCE($4, done), \
                    updated_at  = $5 \
              WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name.as_deref())
        .bind(data.name.as_deref().map(str::to_lowercase))
        .bind(data.done)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Hard delete. `Ok(false)` when no task has this id.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, TaskError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("50%"), r"%50\%%");
        assert_eq!(like_pattern("a_b"), r"%a\_b%");
        assert_eq!(like_pattern(r"c:\tmp"), r"%c:\\tmp%");
    }
}
