use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::db::models::User;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Header carrying the session token, on requests and on register/login responses.
pub const AUTH_HEADER: &str = "x-auth";

/// The caller resolved from the `x-auth` header.
///
/// Taking this as a handler argument puts the handler behind the auth gate:
/// extraction fails with a 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req
            .headers()
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("application state is not registered".into()))?;
            let token = token.ok_or(AuthError::Unauthenticated)?;

            let user = state.auth_service.find_by_token(&token).await?;
            Ok::<_, AppError>(AuthenticatedUser { user, token })
        })
    }
}
