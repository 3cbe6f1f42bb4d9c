use std::sync::Arc;
use todo_core::repo::drivers::{DocumentDriver, MemoryDriver};
use todo_core::specification::todo::HasPriority;
use todo_core::{
    Identity, NewTodo, Priority, RepoError, TodoService, TodoStore, TodoValidationError,
    ValidatorRegistry,
};

fn memory_service() -> TodoService<TodoStore<MemoryDriver>> {
    TodoService::new(TodoStore::with_default_validators(MemoryDriver::new()))
}

#[tokio::test]
async fn add_complete_reopen_rename_flow() {
    let service = memory_service();
    let id = service
        .add_todo(NewTodo::new("  Buy milk  ").priority(Priority::High))
        .await
        .unwrap();

    let created = service.get(&id).await.unwrap().unwrap();
    assert_eq!(created.title().as_str(), "Buy milk");
    assert!(!created.completed());

    service.complete(&id).await.unwrap();
    assert_eq!(service.counts().await.unwrap(), (1, 0, 1));
    assert_eq!(service.list_completed().await.unwrap().len(), 1);

    service.reopen(&id).await.unwrap();
    service.rename(&id, "Buy oat milk").await.unwrap();
    let renamed = service.get(&id).await.unwrap().unwrap();
    assert_eq!(renamed.title().as_str(), "Buy oat milk");
    assert_eq!(renamed.priority(), Priority::High);
    assert_eq!(service.list_active().await.unwrap().len(), 1);
}

#[tokio::test]
async fn add_todo_rejects_invalid_input_without_writing() {
    let service = memory_service();

    let err = service.add_todo(NewTodo::new("a")).await.unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TodoValidationError::TitleTooShort { chars: 1 })
    ));

    let err = service
        .add_todo(NewTodo::new("Time travel").due_date(0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation_failed");
    assert_eq!(service.counts().await.unwrap(), (0, 0, 0));
}

#[tokio::test]
async fn overdue_lists_only_open_past_due_todos() {
    let service = memory_service();
    let now = todo_core::model::todo::now_epoch_ms();
    let due_soon = now + 1_000;

    let late = service
        .add_todo(NewTodo::new("File taxes").due_date(due_soon))
        .await
        .unwrap();
    let done = service
        .add_todo(NewTodo::new("Pay rent").due_date(due_soon))
        .await
        .unwrap();
    service.add_todo(NewTodo::new("Someday")).await.unwrap();
    service.complete(&done).await.unwrap();

    assert!(service.overdue(now).await.unwrap().is_empty());

    let overdue = service.overdue(due_soon + 1).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id(), Some(&late));
}

#[tokio::test]
async fn service_runs_over_a_shared_dyn_repository() {
    let registry = Arc::new(ValidatorRegistry::with_defaults());
    let repo: Arc<dyn todo_core::TodoRepository> =
        Arc::new(TodoStore::new(DocumentDriver::in_memory(), Arc::clone(&registry)));
    let service = TodoService::new(Arc::clone(&repo));

    let id = service
        .add_todo(NewTodo::new("Water plants").priority(Priority::Low))
        .await
        .unwrap();
    assert_eq!(id.type_name(), "object_id");

    let low = service.find(&HasPriority(Priority::Low)).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(repo.count().await.unwrap(), 1);

    service.delete(&id).await.unwrap();
    let missing = Identity::parse(id.as_str(), &registry).unwrap();
    assert!(matches!(
        service.delete(&missing).await,
        Err(RepoError::NotFound(_))
    ));
}
