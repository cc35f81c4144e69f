use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{AuthToken, Todo, User};
use crate::Result;

/// Persistence for users and their session tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user. Fails with `DatabaseError::Duplicate` when the
    /// email is taken, and refuses users whose password is not yet hashed.
    async fn insert_user(&self, user: &User) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Finds the user with `id` only if `token` is one of its live `auth` tokens.
    async fn find_by_token(&self, id: Uuid, token: &str) -> Result<Option<User>>;

    async fn push_token(&self, user_id: Uuid, token: &AuthToken) -> Result<()>;

    /// Removes every entry matching `token`. Removing an absent token succeeds.
    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<()>;
}

/// Persistence for todos. Every lookup is filtered by owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert_todo(&self, todo: &Todo) -> Result<Todo>;

    async fn find_todos(&self, owner_id: Uuid) -> Result<Vec<Todo>>;

    async fn find_todo(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Todo>>;

    /// Writes `todo` back if it still exists under the same owner.
    async fn update_todo(&self, todo: &Todo) -> Result<Option<Todo>>;

    async fn delete_todo(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Todo>>;
}
