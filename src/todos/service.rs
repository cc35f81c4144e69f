use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::models::{now_millis, Todo, TodoUpdate};
use crate::db::store::TodoStore;
use crate::error::AppError;
use crate::validation::validate_todo_text;
use crate::Result;

/// Todo operations on behalf of an already resolved owner.
///
/// A malformed id, a missing todo and another user's todo all come back as
/// `AppError::NotFound`.
pub struct TodoService {
    todos: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoStore>) -> Self {
        Self { todos }
    }

    pub async fn create(&self, owner_id: Uuid, text: &str) -> Result<Todo> {
        let text = validate_todo_text(text)?;
        self.todos.insert_todo(&Todo::new(owner_id, text)).await
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Todo>> {
        self.todos.find_todos(owner_id).await
    }

    pub async fn get(&self, owner_id: Uuid, raw_id: &str) -> Result<Todo> {
        let id = parse_id(raw_id)?;
        self.todos
            .find_todo(id, owner_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, owner_id: Uuid, raw_id: &str) -> Result<Todo> {
        let id = parse_id(raw_id)?;
        self.todos
            .delete_todo(id, owner_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update(&self, owner_id: Uuid, raw_id: &str, mut update: TodoUpdate) -> Result<Todo> {
        let id = parse_id(raw_id)?;

        let mut todo = self
            .todos
            .find_todo(id, owner_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(text) = update.text.take() {
            update.text = Some(validate_todo_text(&text)?);
        }
        todo.apply_update(update, now_millis());

        self.todos
            .update_todo(&todo)
            .await?
            .ok_or(AppError::NotFound)
    }
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        debug!("Malformed todo id {:?}", raw);
        AppError::NotFound
    })
}
