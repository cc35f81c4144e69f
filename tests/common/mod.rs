#![allow(dead_code)]

use std::sync::Arc;

use todo_server::db::{Todo, TodoStore, User};
use todo_server::{AppState, InMemoryStore, Settings};

pub struct SeedUser {
    pub user: User,
    pub password: String,
    pub token: String,
}

/// Two users with one session each, and one todo per user; the second todo
/// is already completed.
pub struct Seed {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub users: Vec<SeedUser>,
    pub todos: Vec<Todo>,
}

pub async fn seed() -> Seed {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let (state, store) = AppState::in_memory(config);

    let mut users = Vec::new();
    for (name, email, password) in [
        ("Andrew", "andrew@example.com", "userOnePass"),
        ("Jen", "jen@example.com", "userTwoPass"),
    ] {
        let (user, token) = state
            .auth_service
            .register(name, email, password)
            .await
            .expect("Failed to seed user");
        users.push(SeedUser {
            user,
            password: password.to_string(),
            token,
        });
    }

    let first = Todo::new(users[0].user.id, "First test todo".into());
    let mut second = Todo::new(users[1].user.id, "Second test todo".into());
    second.completed = true;
    second.completed_at = Some(333);

    let mut todos = Vec::new();
    for todo in [first, second] {
        todos.push(store.insert_todo(&todo).await.expect("Failed to seed todo"));
    }

    Seed { state, store, users, todos }
}

/// Builds the full route table over `state`'s stores.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .configure(todo_server::configure),
        )
        .await
    };
}
