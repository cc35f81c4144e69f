use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The only access level tokens are issued with.
pub const AUTH_ACCESS: &str = "auth";

/// A user's password as held in memory.
///
/// `Plain` marks a value set since the user was loaded and not yet hashed;
/// `Hashed` is what the store hands back and the only form it will persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Password {
    Plain(String),
    Hashed(String),
}

impl Password {
    pub fn hash(&self) -> Option<&str> {
        match self {
            Password::Hashed(hash) => Some(hash),
            Password::Plain(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuthToken {
    pub access: String,
    pub token: String,
}

impl AuthToken {
    pub fn auth(token: String) -> Self {
        Self {
            access: AUTH_ACCESS.to_string(),
            token,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: Password,
    pub tokens: Vec<AuthToken>,
}

impl User {
    pub fn new(name: String, email: String, password: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password: Password::Plain(password),
            tokens: Vec::new(),
        }
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.access == AUTH_ACCESS && t.token == token)
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The only shape a user is ever serialized in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    /// Milliseconds since the Unix epoch.
    pub completed_at: Option<i64>,
    pub owner_id: Uuid,
}

/// Fields a client may change on an existing todo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl Todo {
    pub fn new(owner_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            completed: false,
            completed_at: None,
            owner_id,
        }
    }

    /// Applies an already validated update. `completed_at` is owned by the
    /// server: set on completion if not yet set, cleared on un-completion.
    pub fn apply_update(&mut self, update: TodoUpdate, now_millis: i64) {
        if let Some(text) = update.text {
            self.text = text;
        }
        match update.completed {
            Some(true) => {
                self.completed = true;
                if self.completed_at.is_none() {
                    self.completed_at = Some(now_millis);
                }
            }
            Some(false) => {
                self.completed = false;
                self.completed_at = None;
            }
            None => {}
        }
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_todo_is_incomplete() {
        let todo = Todo::new(Uuid::new_v4(), "Walk the dog".into());
        assert!(!todo.completed);
        assert_eq!(todo.completed_at, None);
    }

    #[test]
    fn test_completing_sets_timestamp_once() {
        let mut todo = Todo::new(Uuid::new_v4(), "Walk the dog".into());
        todo.apply_update(TodoUpdate { text: None, completed: Some(true) }, 1_000);
        assert!(todo.completed);
        assert_eq!(todo.completed_at, Some(1_000));

        todo.apply_update(TodoUpdate { text: None, completed: Some(true) }, 2_000);
        assert_eq!(todo.completed_at, Some(1_000));
    }

    #[test]
    fn test_uncompleting_clears_timestamp() {
        let mut todo = Todo::new(Uuid::new_v4(), "Walk the dog".into());
        todo.apply_update(TodoUpdate { text: None, completed: Some(true) }, 1_000);
        todo.apply_update(TodoUpdate { text: None, completed: Some(false) }, 2_000);
        assert!(!todo.completed);
        assert_eq!(todo.completed_at, None);
    }

    #[test]
    fn test_text_only_update_keeps_completion() {
        let mut todo = Todo::new(Uuid::new_v4(), "Walk the dog".into());
        todo.apply_update(TodoUpdate { text: None, completed: Some(true) }, 1_000);
        todo.apply_update(TodoUpdate { text: Some("Feed the cat".into()), completed: None }, 2_000);
        assert_eq!(todo.text, "Feed the cat");
        assert!(todo.completed);
        assert_eq!(todo.completed_at, Some(1_000));
    }

    #[test]
    fn test_todo_serializes_camel_case() {
        let todo = Todo::new(Uuid::new_v4(), "Walk the dog".into());
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["completedAt"], serde_json::Value::Null);
        assert_eq!(json["ownerId"], todo.owner_id.to_string());
        assert_eq!(json["completed"], false);
    }

    #[test]
    fn test_update_ignores_client_completed_at() {
        let update: TodoUpdate =
            serde_json::from_str(r#"{"completed": false, "completedAt": 333}"#).unwrap();
        let mut todo = Todo::new(Uuid::new_v4(), "Walk the dog".into());
        todo.apply_update(update, 1_000);
        assert_eq!(todo.completed_at, None);
    }

    #[test]
    fn test_public_projection_hides_credentials() {
        let mut user = User::new("Rohit".into(), "rohit@example.com".into(), "123abcdef".into());
        user.tokens.push(AuthToken::auth("some.jwt.token".into()));
        let json = serde_json::to_value(user.public()).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(json["email"], "rohit@example.com");
        assert!(json.get("password").is_none());
        assert!(json.get("tokens").is_none());
    }

    #[test]
    fn test_has_token_requires_auth_access() {
        let mut user = User::new("Rohit".into(), "rohit@example.com".into(), "123abcdef".into());
        user.tokens.push(AuthToken {
            access: "reset".into(),
            token: "abc".into(),
        });
        assert!(!user.has_token("abc"));
        user.tokens.push(AuthToken::auth("abc".into()));
        assert!(user.has_token("abc"));
    }

    #[test]
    fn test_new_password_is_plain_until_hashed() {
        let mut user = User::new("Rohit".into(), "rohit@example.com".into(), "123abcdef".into());
        assert_eq!(user.password, Password::Plain("123abcdef".into()));
        assert_eq!(user.password.hash(), None);

        user.password = Password::Hashed("$2b$04$hash".into());
        assert_eq!(user.password.hash(), Some("$2b$04$hash"));
    }
}
