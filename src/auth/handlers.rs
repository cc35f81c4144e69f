use actix_web::{web, HttpResponse};
use serde::Deserialize;
use crate::AppState;
use crate::auth::extractor::{AuthenticatedUser, AUTH_HEADER};
use crate::error::AppError;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for email: {}", req.email.trim());

    match state.auth_service.register(&req.name, &req.email, &req.password).await {
        Ok((user, token)) => Ok(HttpResponse::Ok()
            .insert_header((AUTH_HEADER, token))
            .json(user.public())),
        Err(e) => {
            warn!("Registration failed for email: {}: {}", req.email.trim(), e);
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email.trim());

    match state.auth_service.login(&req.email, &req.password).await {
        Ok((user, token)) => {
            info!("Login successful for email: {}", user.email);
            Ok(HttpResponse::Ok()
                .insert_header((AUTH_HEADER, token))
                .json(user.public()))
        }
        Err(e) => {
            warn!("Login failed for email: {}: {}", req.email.trim(), e);
            Err(e)
        }
    }
}

pub async fn me(auth: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(auth.user.public())
}

pub async fn logout(
    auth: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.auth_service.logout(&auth.user, &auth.token).await?;
    Ok(HttpResponse::Ok().finish())
}
