//! Storage layer for the todo service.
//!
//! `UserStore` and `TodoStore` are the seam the services depend on;
//! `DbOperations` implements them on Postgres and `InMemoryStore` in memory.

pub mod memory;
pub mod models;
pub mod operations;
pub mod store;

pub use memory::InMemoryStore;
pub use models::{AuthToken, Password, PublicUser, Todo, TodoUpdate, User};
pub use operations::{DbOperations, DbPoolStatus};
pub use store::{TodoStore, UserStore};
