//! Input checks that run before anything reaches a store.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;
use crate::Result;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

/// Registration input after trimming and checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(name: &str, email: &str, password: &str) -> Result<NewUserInput> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(AppError::ValidationError(format!(
            "name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }

    let email = validate_email(email)?;

    // Passwords are taken as given: whitespace is part of the secret.
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(NewUserInput {
        name: name.to_string(),
        email,
        password: password.to_string(),
    })
}

pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() || !EMAIL_RE.is_match(email) {
        return Err(AppError::ValidationError(format!("{} is not a valid email", email)));
    }
    Ok(email.to_string())
}

pub fn validate_todo_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::ValidationError("text must not be empty".into()));
    }
    Ok(text.to_string())
}
