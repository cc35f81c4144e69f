//! Owner-scoped todo operations and their HTTP handlers.

pub mod handlers;
mod service;

pub use service::TodoService;
