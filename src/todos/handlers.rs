use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::db::models::TodoUpdate;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub text: String,
}

pub async fn create_todo(
    auth: AuthenticatedUser,
    req: web::Json<CreateTodoRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let todo = state.todo_service.create(auth.user.id, &req.text).await?;
    info!("User {} created todo {}", auth.user.id, todo.id);
    Ok(HttpResponse::Ok().json(todo))
}

pub async fn list_todos(
    auth: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let todos = state.todo_service.list(auth.user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "todos": todos })))
}

pub async fn get_todo(
    auth: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let todo = state.todo_service.get(auth.user.id, &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "todo": todo })))
}

pub async fn delete_todo(
    auth: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let todo = state.todo_service.delete(auth.user.id, &path).await?;
    info!("User {} deleted todo {}", auth.user.id, todo.id);
    Ok(HttpResponse::Ok().json(json!({ "todo": todo })))
}

pub async fn update_todo(
    auth: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<TodoUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let todo = state
        .todo_service
        .update(auth.user.id, &path, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "todo": todo })))
}
