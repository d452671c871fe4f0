//! Integration tests for the task query layer: pagination, search, ordering
//! and the single-item operations.

use std::str::FromStr;

use db::models::task::{
    CreateTask, ListTasksParams, SortOrder, Task, TaskError, TaskListQuery, UpdateTask,
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tempfile::TempDir;

/// Create a file-backed SQLite pool with migrations applied.
async fn setup_test_pool() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let options =
        SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.to_string_lossy()))
            .expect("Invalid database URL")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to create pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    (pool, temp_dir)
}

async fn seed(pool: &SqlitePool, names: &[&str]) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(names.len());
    for name in names {
        tasks.push(
            Task::create(pool, &CreateTask::new(*name))
                .await
                .expect("Failed to create task"),
        );
    }
    tasks
}

fn list_query(page: &str, limit: &str, sort: &str, search: Option<&str>) -> TaskListQuery {
    ListTasksParams {
        page: Some(page.to_string()),
        limit: Some(limit.to_string()),
        sort: Some(sort.to_string()),
        search: search.map(str::to_owned),
    }
    .normalize()
}

#[tokio::test]
async fn test_create_defaults() {
    let (pool, _dir) = setup_test_pool().await;

    let task = Task::create(&pool, &CreateTask::new("Buy milk")).await.unwrap();

    assert!(task.id > 0);
    assert_eq!(task.name, "Buy milk");
    assert!(!task.done);
    assert!(task.updated_at.is_none());
}

#[tokio::test]
async fn test_create_rejects_invalid_name() {
    let (pool, _dir) = setup_test_pool().await;

    let result = Task::create(&pool, &CreateTask::new("")).await;
    assert!(matches!(result, Err(TaskError::Invalid(_))));

    let result = Task::create(&pool, &CreateTask::new("x".repeat(256))).await;
    assert!(matches!(result, Err(TaskError::Invalid(_))));
}

#[tokio::test]
async fn test_create_then_fetch_round_trip() {
    let (pool, _dir) = setup_test_pool().await;

    let created = Task::create(
        &pool,
        &CreateTask {
            name: "Write report".to_string(),
            done: true,
        },
    )
    .await
    .unwrap();

    let fetched = Task::find_by_id(&pool, created.id).await.unwrap();
    assert_eq!(fetched, Some(created));
}

#[tokio::test]
async fn test_find_by_id_missing_is_none() {
    let (pool, _dir) = setup_test_pool().await;

    assert_eq!(Task::find_by_id(&pool, 9999).await.unwrap(), None);
}

#[tokio::test]
async fn test_update_partial_fields() {
    let (pool, _dir) = setup_test_pool().await;
    let task = seed(&pool, &["Buy milk"]).await.remove(0);

    let updated = Task::update(
        &pool,
        task.id,
        &UpdateTask {
            name: None,
            done: Some(true),
        },
    )
    .await
    .unwrap()
    .expect("task exists");

    assert_eq!(updated.id, task.id);
    assert_eq!(updated.name, "Buy milk");
    assert!(updated.done);
    assert_eq!(updated.created_at, task.created_at);
    assert!(updated.updated_at.is_some());

    let renamed = Task::update(
        &pool,
        task.id,
        &UpdateTask {
            name: Some("Buy oat milk".to_string()),
            done: None,
        },
    )
    .await
    .unwrap()
    .expect("task exists");

    assert_eq!(renamed.name, "Buy oat milk");
    assert!(renamed.done);
}

#[tokio::test]
async fn test_update_empty_is_rejected() {
    let (pool, _dir) = setup_test_pool().await;
    let task = seed(&pool, &["Buy milk"]).await.remove(0);

    let result = Task::update(&pool, task.id, &UpdateTask::default()).await;
    assert!(matches!(result, Err(TaskError::EmptyUpdate)));

    let unchanged = Task::find_by_id(&pool, task.id).await.unwrap();
    assert_eq!(unchanged, Some(task));
}

#[tokio::test]
async fn test_update_missing_is_none() {
    let (pool, _dir) = setup_test_pool().await;

    let result = Task::update(
        &pool,
        42,
        &UpdateTask {
            name: None,
            done: Some(true),
        },
    )
    .await
    .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete() {
    let (pool, _dir) = setup_test_pool().await;
    let task = seed(&pool, &["Buy milk"]).await.remove(0);

    assert!(Task::delete(&pool, task.id).await.unwrap());
    assert!(!Task::delete(&pool, task.id).await.unwrap());
    assert_eq!(Task::find_by_id(&pool, task.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_find_page_windows_and_counts() {
    let (pool, _dir) = setup_test_pool().await;
    let names: Vec<String> = (1..=25).map(|i| format!("Task {i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    seed(&pool, &refs).await;

    let first = Task::find_page(&pool, &list_query("1", "10", "asc", None))
        .await
        .unwrap();
    assert_eq!(first.data.len(), 10);
    assert_eq!(first.meta.current_page, 1);
    assert_eq!(first.meta.limit, 10);
    assert_eq!(first.meta.total_count, 25);
    assert_eq!(first.meta.total_pages, 3);
    assert_eq!(first.data[0].name, "Task 1");

    let last = Task::find_page(&pool, &list_query("3", "10", "asc", None))
        .await
        .unwrap();
    assert_eq!(last.data.len(), 5);
    assert_eq!(last.data[0].name, "Task 21");

    let beyond = Task::find_page(&pool, &list_query("4", "10", "asc", None))
        .await
        .unwrap();
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.meta.total_count, 25);
}

#[tokio::test]
async fn test_find_page_sort_order() {
    let (pool, _dir) = setup_test_pool().await;
    let tasks = seed(&pool, &["first", "second", "third"]).await;

    let desc = Task::find_page(&pool, &TaskListQuery::default()).await.unwrap();
    assert_eq!(TaskListQuery::default().sort, SortOrder::Desc);
    let desc_ids: Vec<i64> = desc.data.iter().map(|t| t.id).collect();
    assert_eq!(desc_ids, vec![tasks[2].id, tasks[1].id, tasks[0].id]);

    let asc = Task::find_page(&pool, &list_query("1", "10", "asc", None))
        .await
        .unwrap();
    let asc_ids: Vec<i64> = asc.data.iter().map(|t| t.id).collect();
    assert_eq!(asc_ids, vec![tasks[0].id, tasks[1].id, tasks[2].id]);
}

#[tokio::test]
async fn test_find_page_search_is_case_insensitive_substring() {
    let (pool, _dir) = setup_test_pool().await;
    seed(&pool, &["Buy milk", "Walk the dog", "Buy MILK chocolate"]).await;

    let page = Task::find_page(&pool, &list_query("1", "10", "asc", Some("  Milk ")))
        .await
        .unwrap();
    let names: Vec<&str> = page.data.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Buy milk", "Buy MILK chocolate"]);
    assert_eq!(page.meta.total_count, 2);
    assert_eq!(page.meta.total_pages, 1);

    let none = Task::find_page(&pool, &list_query("1", "10", "asc", Some("groceries")))
        .await
        .unwrap();
    assert!(none.data.is_empty());
    assert_eq!(none.meta.total_count, 0);
    assert_eq!(none.meta.total_pages, 0);
}

#[tokio::test]
async fn test_find_page_search_folds_non_ascii_case() {
    let (pool, _dir) = setup_test_pool().await;
    let tasks = seed(&pool, &["École trip", "ÄPFEL kaufen", "Walk the dog"]).await;

    for (term, expected) in [
        ("école", "École trip"),
        ("ÉCOLE", "École trip"),
        ("äpfel", "ÄPFEL kaufen"),
    ] {
        let page = Task::find_page(&pool, &list_query("1", "10", "asc", Some(term)))
            .await
            .unwrap();
        assert_eq!(page.meta.total_count, 1, "search {term}");
        assert_eq!(page.data[0].name, expected);
    }

    // Renaming refreshes the folded copy
    Task::update(
        &pool,
        tasks[2].id,
        &UpdateTask {
            name: Some("Über den Fluss".to_string()),
            done: None,
        },
    )
    .await
    .unwrap()
    .unwrap();

    let renamed = Task::find_page(&pool, &list_query("1", "10", "asc", Some("über")))
        .await
        .unwrap();
    assert_eq!(renamed.meta.total_count, 1);
    assert_eq!(renamed.data[0].id, tasks[2].id);

    let stale = Task::find_page(&pool, &list_query("1", "10", "asc", Some("dog")))
        .await
        .unwrap();
    assert_eq!(stale.meta.total_count, 0);
}

#[tokio::test]
async fn test_find_page_search_treats_wildcards_literally() {
    let (pool, _dir) = setup_test_pool().await;
    seed(&pool, &["100% done", "100 items", "snake_case", "snakecase"]).await;

    let percent = Task::find_page(&pool, &list_query("1", "10", "asc", Some("100%")))
        .await
        .unwrap();
    assert_eq!(percent.meta.total_count, 1);
    assert_eq!(percent.data[0].name, "100% done");

    let underscore = Task::find_page(&pool, &list_query("1", "10", "asc", Some("e_c")))
        .await
        .unwrap();
    assert_eq!(underscore.meta.total_count, 1);
    assert_eq!(underscore.data[0].name, "snake_case");
}

#[tokio::test]
async fn test_find_page_never_exceeds_limit() {
    let (pool, _dir) = setup_test_pool().await;
    let names: Vec<String> = (1..=12).map(|i| format!("Chore {i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    seed(&pool, &refs).await;

    for limit in ["1", "5", "12", "100", "0", "-1"] {
        let query = list_query("1", limit, "desc", None);
        let page = Task::find_page(&pool, &query).await.unwrap();
        assert!(page.data.len() <= query.limit as usize);
        assert_eq!(page.meta.total_count, 12);
    }
}
