use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{AuthToken, Todo, User};
use crate::db::store::{TodoStore, UserStore};
use crate::error::{AppError, DatabaseError};
use crate::Result;

/// Store that keeps everything in process memory.
///
/// Mirrors the Postgres store's rules (unique emails, owner-filtered todos,
/// hashed passwords only) so the service behaves the same on top of either.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    // Vec keeps creation order for listing.
    todos: RwLock<Vec<Todo>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn todo_count(&self) -> usize {
        self.todos.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<User> {
        if user.password.hash().is_none() {
            return Err(AppError::InternalError("refusing to persist an unhashed password".into()));
        }

        let mut users = self.users.write().await;
        if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
            return Err(AppError::DatabaseError(DatabaseError::Duplicate));
        }
        users.insert(user.id, user.clone());

        Ok(user.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_token(&self, id: Uuid, token: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.has_token(token)).cloned())
    }

    async fn push_token(&self, user_id: Uuid, token: &AuthToken) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or(AppError::DatabaseError(DatabaseError::NotFound))?;
        user.tokens.push(token.clone());
        Ok(())
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&user_id) {
            user.tokens.retain(|t| t.token != token);
        }
        Ok(())
    }
}

#[async_trait]
impl TodoStore for InMemoryStore {
    async fn insert_todo(&self, todo: &Todo) -> Result<Todo> {
        let mut todos = self.todos.write().await;
        if todos.iter().any(|t| t.id == todo.id) {
            return Err(AppError::DatabaseError(DatabaseError::Duplicate));
        }
        todos.push(todo.clone());
        Ok(todo.clone())
    }

    async fn find_todos(&self, owner_id: Uuid) -> Result<Vec<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos.iter().filter(|t| t.owner_id == owner_id).cloned().collect())
    }

    async fn find_todo(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned())
    }

    async fn update_todo(&self, todo: &Todo) -> Result<Option<Todo>> {
        let mut todos = self.todos.write().await;
        match todos
            .iter_mut()
            .find(|t| t.id == todo.id && t.owner_id == todo.owner_id)
        {
            Some(stored) => {
                stored.text = todo.text.clone();
                stored.completed = todo.completed;
                stored.completed_at = todo.completed_at;
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_todo(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Todo>> {
        let mut todos = self.todos.write().await;
        let position = todos
            .iter()
            .position(|t| t.id == id && t.owner_id == owner_id);
        Ok(position.map(|index| todos.remove(index)))
    }
}
