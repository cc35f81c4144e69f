pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod todos;
pub mod validation;

use std::sync::Arc;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web::error::JsonPayloadError;
use tracing::info;

pub use crate::error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{AuthService, AuthenticatedUser, AUTH_HEADER};
pub use db::{DbOperations, InMemoryStore, TodoStore, UserStore};
pub use todos::TodoService;

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and, when running on
/// Postgres, the connection pool status
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = match &state.database {
        Some(db) => Some(db.get_pool_status().await),
        None => None,
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": database,
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
    pub todo_service: Arc<TodoService>,
    pub database: Option<Arc<DbOperations>>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the services to it.
    pub async fn new(config: Settings) -> Result<Self> {
        let db = Arc::new(DbOperations::connect(&config.database).await?);
        db.migrate().await?;
        info!("Database migrations applied");

        let mut state = Self::with_stores(config, db.clone(), db.clone());
        state.database = Some(db);
        Ok(state)
    }

    pub fn with_stores(
        config: Settings,
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
    ) -> Self {
        let auth_service = AuthService::new(users, &config.auth);
        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            todo_service: Arc::new(TodoService::new(todos)),
            database: None,
        }
    }

    /// State backed by a fresh `InMemoryStore`, which is also returned.
    pub fn in_memory(config: Settings) -> (Self, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (Self::with_stores(config, store.clone(), store.clone()), store)
    }

    pub async fn shutdown(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}

/// Rejects unparsable request bodies with a 400 in the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        AppError::ValidationError(err.to_string()).into()
    })
}

/// Registers every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/users")
                .route("", web::post().to(auth::handlers::register))
                .route("/login", web::post().to(auth::handlers::login))
                .route("/me", web::get().to(auth::handlers::me))
                .route("/me/token", web::delete().to(auth::handlers::logout)),
        )
        .service(
            web::scope("/todos")
                .route("", web::post().to(todos::handlers::create_todo))
                .route("", web::get().to(todos::handlers::list_todos))
                .route("/{id}", web::get().to(todos::handlers::get_todo))
                .route("/{id}", web::delete().to(todos::handlers::delete_todo))
                .route("/{id}", web::patch().to(todos::handlers::update_todo)),
        );
}
