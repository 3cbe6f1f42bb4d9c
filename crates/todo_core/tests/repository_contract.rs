use std::error::Error;
use std::sync::Arc;
use tempfile::TempDir;
use todo_core::repo::drivers::{ActiveRecordDriver, DocumentDriver, RelationalDriver};
use todo_core::specification::todo::{HasPriority, IsActive, TitleContains};
use todo_core::specification::Specification;
use todo_core::{
    open_repository, BackendKind, Identity, Priority, RepoError, StoreConfig, Todo,
    TodoPatch, TodoRepository, TodoStore, TodoValidationError, ValidatorRegistry,
};

const UNKNOWN_UUID: &str = "3f2c9a7e-1b4d-4e8a-9c0f-5d6e7a8b9c0d";
const UNKNOWN_OBJECT_ID: &str = "64b7f0c2a1e3d4f5a6b7c8d9";

struct Backend {
    label: String,
    repo: Arc<dyn TodoRepository>,
    _dir: Option<TempDir>,
}

fn registry() -> Arc<ValidatorRegistry> {
    Arc::new(ValidatorRegistry::with_defaults())
}

/// Every backend, in memory and (where it has one) on disk.
async fn backends() -> Vec<Backend> {
    let mut backends = Vec::new();

    for kind in BackendKind::ALL {
        let repo = open_repository(&StoreConfig::new(kind, None), registry())
            .await
            .unwrap();
        backends.push(Backend {
            label: kind.to_string(),
            repo,
            _dir: None,
        });
    }

    for kind in [
        BackendKind::Sqlite,
        BackendKind::Relational,
        BackendKind::ActiveRecord,
        BackendKind::Document,
    ] {
        let dir = tempfile::tempdir().unwrap();
        let location = match kind {
            BackendKind::Document => dir.path().join("todos.jsonl").display().to_string(),
            BackendKind::Sqlite => dir.path().join("todos.db").display().to_string(),
            _ => format!("sqlite://{}", dir.path().join("todos.db").display()),
        };
        let repo = open_repository(&StoreConfig::new(kind, Some(location)), registry())
            .await
            .unwrap();
        backends.push(Backend {
            label: format!("{kind}-file"),
            repo,
            _dir: Some(dir),
        });
    }

    backends
}

fn todo_at(title: &str, created_at: i64) -> Todo {
    Todo::builder(title).created_at(created_at).build().unwrap()
}

async fn assert_counts_consistent(backend: &Backend) {
    let repo = &backend.repo;
    let total = repo.count().await.unwrap();
    let active = repo.count_active().await.unwrap();
    let completed = repo.count_completed().await.unwrap();
    assert_eq!(active + completed, total, "backend {}", backend.label);
}

#[tokio::test]
async fn create_then_get_round_trips_every_field() {
    for backend in backends().await {
        let todo = Todo::builder("Write report")
            .priority(Priority::Low)
            .completed(true)
            .created_at(1_700_000_000_000)
            .due_date(Some(1_700_000_500_000))
            .build()
            .unwrap();

        let id = backend.repo.create(&todo).await.unwrap();
        let loaded = backend.repo.get_by_id(&id).await.unwrap().unwrap();

        assert_eq!(loaded.id(), Some(&id), "backend {}", backend.label);
        assert_eq!(loaded.title(), todo.title(), "backend {}", backend.label);
        assert_eq!(loaded.priority(), Priority::Low, "backend {}", backend.label);
        assert!(loaded.completed(), "backend {}", backend.label);
        assert_eq!(loaded.created_at(), todo.created_at(), "backend {}", backend.label);
        assert_eq!(loaded.due_date(), todo.due_date(), "backend {}", backend.label);
    }
}

#[tokio::test]
async fn ids_match_the_backend_native_format() {
    for backend in backends().await {
        let id = backend
            .repo
            .create(&Todo::new("Check id").unwrap())
            .await
            .unwrap();

        let expected = if backend.label.starts_with("document") {
            "object_id"
        } else {
            "uuid"
        };
        assert_eq!(id.type_name(), expected, "backend {}", backend.label);
    }
}

#[tokio::test]
async fn unknown_ids_are_not_found_on_every_backend() {
    let registry = registry();
    for backend in backends().await {
        for raw in [UNKNOWN_UUID, UNKNOWN_OBJECT_ID] {
            let id = Identity::parse(raw, &registry).unwrap();

            assert!(backend.repo.get_by_id(&id).await.unwrap().is_none());
            let update = backend
                .repo
                .update(&id, &TodoPatch::new().completed(true))
                .await;
            assert!(
                matches!(update, Err(RepoError::NotFound(ref missing)) if missing == &id),
                "backend {} update: {update:?}",
                backend.label
            );
            let delete = backend.repo.delete(&id).await;
            assert!(
                matches!(delete, Err(RepoError::NotFound(_))),
                "backend {} delete: {delete:?}",
                backend.label
            );
        }
    }
}

#[tokio::test]
async fn lists_are_newest_first_regardless_of_insert_order() {
    for backend in backends().await {
        for (title, created_at) in [("second", 2_000), ("first", 1_000), ("third", 3_000)] {
            backend.repo.create(&todo_at(title, created_at)).await.unwrap();
        }

        let titles: Vec<String> = backend
            .repo
            .get_all()
            .await
            .unwrap()
            .iter()
            .map(|todo| todo.title().to_string())
            .collect();
        assert_eq!(titles, ["third", "second", "first"], "backend {}", backend.label);
    }
}

#[tokio::test]
async fn active_and_completed_lists_partition_all() {
    for backend in backends().await {
        let repo = &backend.repo;
        let open = repo.create(&todo_at("open one", 1_000)).await.unwrap();
        let done = repo.create(&todo_at("done one", 2_000)).await.unwrap();
        repo.create(&todo_at("open two", 3_000)).await.unwrap();
        repo.update(&done, &TodoPatch::new().completed(true))
            .await
            .unwrap();

        let active = repo.get_active().await.unwrap();
        let completed = repo.get_completed().await.unwrap();

        assert_eq!(active.len(), 2, "backend {}", backend.label);
        assert_eq!(active[1].id(), Some(&open), "backend {}", backend.label);
        assert!(active.iter().all(|todo| !todo.completed()));
        assert_eq!(completed.len(), 1, "backend {}", backend.label);
        assert_eq!(completed[0].id(), Some(&done), "backend {}", backend.label);
    }
}

#[tokio::test]
async fn counts_stay_consistent_through_writes() {
    for backend in backends().await {
        let repo = &backend.repo;
        assert_eq!(repo.count().await.unwrap(), 0);
        assert_counts_consistent(&backend).await;

        let mut ids = Vec::new();
        for index in 0..4 {
            ids.push(repo.create(&todo_at(&format!("task {index}"), index)).await.unwrap());
            assert_counts_consistent(&backend).await;
        }

        repo.update(&ids[0], &TodoPatch::new().completed(true))
            .await
            .unwrap();
        assert_counts_consistent(&backend).await;
        repo.update(&ids[1], &TodoPatch::new().completed(true))
            .await
            .unwrap();
        repo.update(&ids[1], &TodoPatch::new().completed(false))
            .await
            .unwrap();
        assert_counts_consistent(&backend).await;
        repo.delete(&ids[2]).await.unwrap();
        assert_counts_consistent(&backend).await;

        assert_eq!(repo.count().await.unwrap(), 3, "backend {}", backend.label);
        assert_eq!(repo.count_completed().await.unwrap(), 1, "backend {}", backend.label);
    }
}

#[tokio::test]
async fn buy_milk_scenario() {
    for backend in backends().await {
        let repo = &backend.repo;
        let todo = Todo::builder("Buy milk")
            .priority(Priority::High)
            .build()
            .unwrap();
        assert!(!todo.is_persisted());

        let id = repo.create(&todo).await.unwrap();
        let stored = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.priority(), Priority::High, "backend {}", backend.label);

        repo.update(&id, &TodoPatch::new().completed(true))
            .await
            .unwrap();
        let updated = repo.get_by_id(&id).await.unwrap().unwrap();
        assert!(updated.completed(), "backend {}", backend.label);
        assert_eq!(updated.title().as_str(), "Buy milk", "backend {}", backend.label);
        assert_eq!(updated.priority(), Priority::High, "backend {}", backend.label);

        repo.delete(&id).await.unwrap();
        assert!(repo.get_by_id(&id).await.unwrap().is_none(), "backend {}", backend.label);
    }
}

#[tokio::test]
async fn patch_accepts_raw_and_wrapped_shapes() {
    for backend in backends().await {
        let repo = &backend.repo;
        let todo = Todo::builder("Plan trip")
            .created_at(1_000)
            .due_date(Some(5_000))
            .build()
            .unwrap();
        let id = repo.create(&todo).await.unwrap();

        let wrapped: TodoPatch = serde_json::from_value(serde_json::json!({
            "title": { "value": "Plan summer trip" },
            "priority": "high",
            "dueDate": null
        }))
        .unwrap();
        repo.update(&id, &wrapped).await.unwrap();

        let loaded = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.title().as_str(), "Plan summer trip", "backend {}", backend.label);
        assert_eq!(loaded.priority(), Priority::High, "backend {}", backend.label);
        assert_eq!(loaded.due_date(), None, "backend {}", backend.label);
        assert_eq!(loaded.created_at(), 1_000, "backend {}", backend.label);
        assert!(!loaded.completed(), "backend {}", backend.label);
    }
}

#[tokio::test]
async fn invalid_writes_fail_validation_and_leave_state_unchanged() {
    for backend in backends().await {
        let repo = &backend.repo;
        let id = repo.create(&todo_at("Keep me", 2_000)).await.unwrap();

        let short = repo.update(&id, &TodoPatch::new().title("x")).await;
        assert!(
            matches!(
                short,
                Err(RepoError::Validation(TodoValidationError::TitleTooShort { .. }))
            ),
            "backend {}",
            backend.label
        );

        let early_due = repo
            .update(&id, &TodoPatch::new().due_date(Some(1_000)))
            .await;
        assert!(
            matches!(
                early_due,
                Err(RepoError::Validation(TodoValidationError::DueBeforeCreation { .. }))
            ),
            "backend {}",
            backend.label
        );

        let bad_priority: TodoPatch =
            serde_json::from_value(serde_json::json!({ "priority": { "value": "urgent" } }))
                .unwrap();
        assert!(matches!(
            repo.update(&id, &bad_priority).await,
            Err(RepoError::Validation(TodoValidationError::UnknownPriority(_)))
        ));

        let loaded = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.title().as_str(), "Keep me", "backend {}", backend.label);
        assert_eq!(loaded.due_date(), None, "backend {}", backend.label);
        assert_eq!(loaded.priority(), Priority::Medium, "backend {}", backend.label);
    }
}

#[tokio::test]
async fn find_by_specification_filters_and_orders() {
    for backend in backends().await {
        let repo = &backend.repo;
        let seed = [
            ("Buy milk", Priority::High, 1_000),
            ("Buy bread", Priority::Low, 2_000),
            ("Call mom", Priority::High, 3_000),
            ("Buy eggs", Priority::High, 4_000),
        ];
        let mut ids = Vec::new();
        for (title, priority, created_at) in seed {
            let todo = Todo::builder(title)
                .priority(priority)
                .created_at(created_at)
                .build()
                .unwrap();
            ids.push(repo.create(&todo).await.unwrap());
        }
        repo.update(&ids[3], &TodoPatch::new().completed(true))
            .await
            .unwrap();

        let spec = TitleContains::new("buy")
            .and(HasPriority(Priority::High))
            .and(IsActive);
        let found = repo.find_by_specification(&spec).await.unwrap();
        assert_eq!(found.len(), 1, "backend {}", backend.label);
        assert_eq!(found[0].id(), Some(&ids[0]), "backend {}", backend.label);

        let either = TitleContains::new("call").or(HasPriority(Priority::Low));
        let titles: Vec<String> = repo
            .find_by_specification(&either)
            .await
            .unwrap()
            .iter()
            .map(|todo| todo.title().to_string())
            .collect();
        assert_eq!(titles, ["Call mom", "Buy bread"], "backend {}", backend.label);
    }
}

#[tokio::test]
async fn deleted_ids_are_not_reissued() {
    for backend in backends().await {
        let repo = &backend.repo;
        let mut seen = std::collections::HashSet::new();
        for index in 0..20 {
            let id = repo.create(&todo_at("churn", index)).await.unwrap();
            assert!(seen.insert(id.clone()), "backend {} reused {id}", backend.label);
            repo.delete(&id).await.unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 0, "backend {}", backend.label);
    }
}

#[tokio::test]
async fn concurrent_creates_all_land() {
    for backend in backends().await {
        let mut handles = Vec::new();
        for index in 0..16 {
            let repo = Arc::clone(&backend.repo);
            handles.push(tokio::spawn(async move {
                repo.create(&todo_at(&format!("parallel {index}"), index))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(backend.repo.count().await.unwrap(), 16, "backend {}", backend.label);
    }
}

fn assert_backend_failure<T: std::fmt::Debug>(
    result: Result<T, RepoError>,
    backend: &str,
    operation: &str,
) {
    match result {
        Err(RepoError::Backend(failure)) => {
            assert_eq!(failure.backend(), backend, "{operation}");
            assert!(failure.source().is_some(), "{operation}");
        }
        other => panic!("{operation} on {backend}: expected backend failure, got {other:?}"),
    }
}

async fn assert_closed_pool_surfaces_backend_failures<R: TodoRepository>(repo: R, backend: &str) {
    let unknown = Identity::parse(UNKNOWN_UUID, &registry()).unwrap();

    let create = repo.create(&Todo::new("Unreachable").unwrap()).await;
    if let Err(err) = &create {
        assert_eq!(err.code(), "backend_failure");
    }
    assert_backend_failure(create, backend, "create");
    assert_backend_failure(repo.get_by_id(&unknown).await, backend, "get_by_id");
    assert_backend_failure(repo.get_all().await, backend, "get_all");
    assert_backend_failure(repo.count_active().await, backend, "count_active");
    assert_backend_failure(
        repo.update(&unknown, &TodoPatch::new().completed(true)).await,
        backend,
        "update",
    );
    assert_backend_failure(repo.delete(&unknown).await, backend, "delete");
    assert_backend_failure(
        repo.find_by_specification(&IsActive).await,
        backend,
        "find_by_specification",
    );
}

#[tokio::test]
async fn driver_errors_surface_as_backend_failures() {
    let relational = RelationalDriver::in_memory().await.unwrap();
    relational.pool().close().await;
    assert_closed_pool_surfaces_backend_failures(
        TodoStore::with_default_validators(relational),
        "relational",
    )
    .await;

    let active_record = ActiveRecordDriver::in_memory().await.unwrap();
    active_record.pool().close().await;
    assert_closed_pool_surfaces_backend_failures(
        TodoStore::with_default_validators(active_record),
        "active_record",
    )
    .await;
}

#[tokio::test]
async fn failed_document_flush_is_a_backend_failure_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let driver = DocumentDriver::open(data_dir.join("todos.jsonl")).await.unwrap();
    let repo = TodoStore::with_default_validators(driver);

    let kept = repo.create(&todo_at("Kept", 1_000)).await.unwrap();

    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, "not a directory").unwrap();

    assert_backend_failure(
        repo.create(&todo_at("Lost", 2_000)).await,
        "document",
        "create",
    );
    assert_backend_failure(
        repo.update(&kept, &TodoPatch::new().completed(true)).await,
        "document",
        "update",
    );
    assert_backend_failure(repo.delete(&kept).await, "document", "delete");

    let remaining = repo.get_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), Some(&kept));
    assert!(!remaining[0].completed());
}
