//! Integration tests for the HTTP task store against a live server.
//!
//! Each test starts `taskzenith-server` on an ephemeral localhost port,
//! seeded with the example data, and drives the board synchronizer through
//! [`HttpTaskStore`].

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use taskzenith::board::{
    BoardError, BoardHandle, BoardSynchronizer, LoadOutcome, MoveOutcome, SyncConfig,
};
use taskzenith::store::http::HttpTaskStore;
use taskzenith::store::{StoreError, TaskStore};
use taskzenith_proto::task::{Priority, StatusValue, Task, TaskId, TaskPatch, TaskStatus};
use taskzenith_server::server::{DEFAULT_MAX_BODY_SIZE, start_server};
use taskzenith_server::store::{Seed, TaskRepository};

fn example_seed() -> Seed {
    let path = Path::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../taskzenith-server/seed.example.json"
    ));
    Seed::from_file(path).expect("example seed")
}

/// Starts a server over `seed` and returns its repository and a store pointed at it.
async fn serve(seed: Seed) -> (Arc<TaskRepository>, HttpTaskStore) {
    let repo = Arc::new(TaskRepository::from_seed(seed));
    let (addr, _handle) = start_server("127.0.0.1:0", Arc::clone(&repo), DEFAULT_MAX_BODY_SIZE)
        .await
        .expect("start server");
    let store =
        HttpTaskStore::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("store");
    (repo, store)
}

fn ids(handle: &BoardHandle, status: TaskStatus) -> Vec<String> {
    handle
        .columns()
        .column(status)
        .tasks
        .iter()
        .map(|t| t.id.to_string())
        .collect()
}

#[tokio::test]
async fn fetch_returns_project_tasks_in_server_order() {
    let (_repo, store) = serve(example_seed()).await;
    let tasks = store.fetch_by_project("proj-1").await.unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["task-1", "task-2", "task-3", "task-4", "task-5", "task-7"]);
    assert_eq!(tasks[0].assignees.len(), 1);
}

#[tokio::test]
async fn update_returns_authoritative_record() {
    let (repo, store) = serve(example_seed()).await;
    let before = repo.task("task-4").await.unwrap();

    let record = store
        .update(&TaskId::new("task-4"), &TaskPatch::status(TaskStatus::Done))
        .await
        .unwrap();
    assert_eq!(record.status(), Some(TaskStatus::Done));
    assert_eq!(record.title, before.title);
    assert!(record.updated_at > before.updated_at);
    assert_eq!(repo.task("task-4").await.unwrap(), record);
}

#[tokio::test]
async fn board_move_round_trip() {
    let (repo, store) = serve(example_seed()).await;
    let (handle, _events) = BoardSynchronizer::spawn(store, SyncConfig::default());

    let outcome = handle.load("proj-1").await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Applied { task_count: 6, .. }));
    assert_eq!(ids(&handle, TaskStatus::Todo), ["task-4", "task-5"]);

    let outcome = handle
        .move_task(&TaskId::new("task-4"), TaskStatus::InProgress)
        .await
        .unwrap();
    assert!(matches!(outcome, MoveOutcome::Committed(_)));
    assert_eq!(ids(&handle, TaskStatus::Todo), ["task-5"]);
    assert_eq!(ids(&handle, TaskStatus::InProgress), ["task-2", "task-3", "task-4"]);
    assert_eq!(
        repo.task("task-4").await.unwrap().status(),
        Some(TaskStatus::InProgress)
    );

    let before = handle.columns();
    handle.load("proj-1").await.unwrap();
    assert_eq!(handle.columns(), before);
}

#[tokio::test]
async fn task_deleted_on_server_reverts_move() {
    let (repo, store) = serve(example_seed()).await;
    let (handle, _events) = BoardSynchronizer::spawn(store, SyncConfig::default());
    handle.load("proj-1").await.unwrap();
    let before = handle.columns();

    repo.delete_task("task-5").await.unwrap();
    let err = handle
        .move_task(&TaskId::new("task-5"), TaskStatus::Done)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::UpdateFailed {
            source: StoreError::NotFound(ref message),
            ..
        } if message == "task not found: task-5"
    ));
    assert_eq!(handle.columns(), before);
}

#[tokio::test]
async fn unknown_project_fails_load() {
    let (_repo, store) = serve(example_seed()).await;
    let (handle, _events) = BoardSynchronizer::spawn(store, SyncConfig::default());

    let err = handle.load("proj-404").await.unwrap_err();
    assert!(matches!(
        err,
        BoardError::FetchFailed {
            source: StoreError::NotFound(_),
            ..
        }
    ));
    assert!(handle.columns().is_empty());
    assert!(handle.view().project_id.is_none());
}

#[tokio::test]
async fn server_side_unknown_status_is_hidden() {
    let mut seed = example_seed();
    let now = Utc::now();
    seed.tasks.push(Task {
        id: TaskId::new("task-9"),
        title: "Archived spike".to_string(),
        description: None,
        status: StatusValue::Unrecognized("archived".to_string()),
        priority: Priority::Low,
        assignees: Vec::new(),
        project_id: "proj-1".to_string(),
        due_date: None,
        created_at: now,
        updated_at: now,
        comments: Vec::new(),
    });
    let (_repo, store) = serve(seed).await;
    let (handle, _events) = BoardSynchronizer::spawn(store, SyncConfig::default());

    let outcome = handle.load("proj-1").await.unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Applied {
            task_count: 6,
            dropped: vec![TaskId::new("task-9")]
        }
    );
    assert!(handle.select_task(&TaskId::new("task-9")).is_none());
}

#[tokio::test]
async fn ids_with_url_syntax_reach_the_right_task() {
    let mut seed = example_seed();
    let now = Utc::now();
    let odd_id = "ops/42?draft#1";
    seed.tasks.push(Task {
        id: TaskId::new(odd_id),
        title: "Rotate keys".to_string(),
        description: None,
        status: TaskStatus::Todo.into(),
        priority: Priority::High,
        assignees: Vec::new(),
        project_id: "proj-1".to_string(),
        due_date: None,
        created_at: now,
        updated_at: now,
        comments: Vec::new(),
    });
    let (repo, store) = serve(seed).await;
    let (handle, _events) = BoardSynchronizer::spawn(store, SyncConfig::default());
    handle.load("proj-1").await.unwrap();

    let outcome = handle
        .move_task(&TaskId::new(odd_id), TaskStatus::Done)
        .await
        .unwrap();
    let MoveOutcome::Committed(record) = outcome else {
        panic!("expected commit");
    };
    assert_eq!(record.id.as_str(), odd_id);
    assert_eq!(repo.task(odd_id).await.unwrap().status(), Some(TaskStatus::Done));
    assert_eq!(
        repo.task("task-4").await.unwrap().status(),
        Some(TaskStatus::Todo)
    );
}

#[tokio::test]
async fn stopped_server_surfaces_transport_error() {
    let store = HttpTaskStore::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let (handle, _events) = BoardSynchronizer::spawn(store, SyncConfig::default());
    let err = handle.load("proj-1").await.unwrap_err();
    assert!(matches!(
        err,
        BoardError::FetchFailed {
            source: StoreError::Transport(_) | StoreError::Timeout,
            ..
        }
    ));
}
