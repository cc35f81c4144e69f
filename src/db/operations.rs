use async_trait::async_trait;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::models::{AuthToken, Password, Todo, User};
use crate::db::store::{TodoStore, UserStore};
use crate::error::AppError;
use crate::Result;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
}

impl UserRow {
    fn into_user(self, tokens: Vec<AuthToken>) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            password: Password::Hashed(self.password_hash),
            tokens,
        }
    }
}

const TODO_COLUMNS: &str = "id, text, completed, completed_at, owner_id";

/// Postgres-backed store.
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        info!("Connected to database (max {} connections)", config.max_connections);
        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn get_pool_status(&self) -> DbPoolStatus {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;

        DbPoolStatus {
            total_connections: size,
            active_connections: size.saturating_sub(idle),
            idle_connections: idle,
        }
    }

    async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>> {
        Ok(self.pool.as_ref().begin().await?)
    }

    async fn create_user_with_transaction(
        &self,
        user: &User,
        password_hash: &str,
        transaction: &mut Transaction<'_, Postgres>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(password_hash)
            .execute(&mut **transaction)
            .await?;

        for token in &user.tokens {
            sqlx::query("INSERT INTO user_tokens (user_id, access, token) VALUES ($1, $2, $3)")
                .bind(user.id)
                .bind(&token.access)
                .bind(&token.token)
                .execute(&mut **transaction)
                .await?;
        }

        Ok(())
    }

    async fn load_tokens(&self, user_id: Uuid) -> Result<Vec<AuthToken>> {
        let tokens = sqlx::query_as::<_, AuthToken>(
            "SELECT access, token FROM user_tokens WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(tokens)
    }

    async fn with_tokens(&self, row: Option<UserRow>) -> Result<Option<User>> {
        match row {
            Some(row) => {
                let tokens = self.load_tokens(row.id).await?;
                Ok(Some(row.into_user(tokens)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for DbOperations {
    async fn insert_user(&self, user: &User) -> Result<User> {
        let password_hash = user
            .password
            .hash()
            .ok_or_else(|| AppError::InternalError("refusing to persist an unhashed password".into()))?;

        let mut transaction = self.begin_transaction().await?;

        let result = self
            .create_user_with_transaction(user, password_hash, &mut transaction)
            .await;

        match result {
            Ok(()) => {
                transaction.commit().await?;
                Ok(user.clone())
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        self.with_tokens(row).await
    }

    async fn find_by_token(&self, id: Uuid, token: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash
            FROM users u
            WHERE u.id = $1
              AND EXISTS (
                SELECT 1 FROM user_tokens t
                WHERE t.user_id = u.id AND t.token = $2 AND t.access = 'auth'
              )
            "#,
        )
        .bind(id)
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        self.with_tokens(row).await
    }

    async fn push_token(&self, user_id: Uuid, token: &AuthToken) -> Result<()> {
        sqlx::query("INSERT INTO user_tokens (user_id, access, token) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(&token.access)
            .bind(&token.token)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TodoStore for DbOperations {
    async fn insert_todo(&self, todo: &Todo) -> Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos ({TODO_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {TODO_COLUMNS}"
        ))
        .bind(todo.id)
        .bind(&todo.text)
        .bind(todo.completed)
        .bind(todo.completed_at)
        .bind(todo.owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(todo)
    }

    async fn find_todos(&self, owner_id: Uuid) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE owner_id = $1 ORDER BY created_at, id"
        ))
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(todos)
    }

    async fn find_todo(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(todo)
    }

    async fn update_todo(&self, todo: &Todo) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos SET text = $3, completed = $4, completed_at = $5
            WHERE id = $1 AND owner_id = $2
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(todo.id)
        .bind(todo.owner_id)
        .bind(&todo.text)
        .bind(todo.completed)
        .bind(todo.completed_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(todo)
    }

    async fn delete_todo(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "DELETE FROM todos WHERE id = $1 AND owner_id = $2 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(todo)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DbPoolStatus {
    pub total_connections: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
}
