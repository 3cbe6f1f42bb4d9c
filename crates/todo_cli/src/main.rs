//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the backend selected by `TODO_BACKEND` / `TODO_DATABASE_URL`.
//! - Run one create, update, list, delete round through the repository
//!   contract and print deterministic `key=value` lines.
//!
//! Set `TODO_LOG_DIR` (absolute path) to also write core log files.

use log::info;
use std::error::Error;
use std::sync::Arc;
use todo_core::specification::todo::TitleContains;
use todo_core::{
    open_repository, NewTodo, Priority, StoreConfig, TodoService, ValidatorRegistry,
};

const LOG_DIR_ENV: &str = "TODO_LOG_DIR";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        todo_core::init_logging(todo_core::default_log_level(), &log_dir)?;
    }

    let config = StoreConfig::from_env()?;
    println!("todo_core version={}", todo_core::core_version());
    println!("backend={}", config.backend);

    let registry = Arc::new(ValidatorRegistry::with_defaults());
    let service = TodoService::new(open_repository(&config, registry).await?);

    let id = service
        .add_todo(NewTodo::new("CLI smoke check").priority(Priority::High))
        .await?;
    println!("created id={} id_type={}", id, id.type_name());

    service.complete(&id).await?;
    let matches = service.find(&TitleContains::new("smoke")).await?;
    println!("matched={}", matches.len());

    let (total, active, completed) = service.counts().await?;
    println!("count total={total} active={active} completed={completed}");

    service.delete(&id).await?;
    let (total, _, _) = service.counts().await?;
    println!("deleted remaining={total}");

    info!("event=cli_smoke module=cli status=ok backend={}", config.backend);
    Ok(())
}
