use crate::config::AuthConfig;
use crate::db::models::{AuthToken, Password, User, AUTH_ACCESS};
use crate::db::store::UserStore;
use crate::error::{AppError, AuthError};
use crate::validation::validate_registration;
use crate::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, decode, Header, EncodingKey, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // User ID
    pub access: String, // Always "auth"
    pub exp: i64,       // Expiration time
    pub iat: i64,       // Issued at
    pub jti: String,    // Unique per token
}

/// Issues, verifies and revokes session tokens, and owns the user
/// credential lifecycle.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_expiry: Duration::hours(config.token_expiry_hours),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Creates a user and opens its first session.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(User, String)> {
        let input = validate_registration(name, email, password)?;

        let mut user = User::new(input.name, input.email, input.password);
        self.hash_password_if_modified(&mut user).await?;
        let mut user = self.users.insert_user(&user).await?;

        let token = self.generate_auth_token(&mut user).await?;
        info!("Registered user {}", user.id);
        Ok((user, token))
    }

    /// Checks credentials and opens an additional session. A missing user
    /// and a wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let mut user = self
            .find_by_credentials(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.generate_auth_token(&mut user).await?;
        info!("User {} logged in ({} active sessions)", user.id, user.tokens.len());
        Ok((user, token))
    }

    pub async fn logout(&self, user: &User, token: &str) -> Result<()> {
        self.remove_token(user, token).await?;
        info!("User {} logged out", user.id);
        Ok(())
    }

    /// Resolves a presented token to the user holding it.
    ///
    /// The signature, expiry and `access` claim must check out, and the token
    /// must still be in the user's token list, so revoked tokens fail even
    /// while their signature is valid.
    pub async fn find_by_token(&self, token: &str) -> Result<User> {
        let claims = self.decode_token(token).map_err(|e| {
            debug!("Rejected token: {}", e);
            e
        })?;

        if claims.access != AUTH_ACCESS {
            debug!("Rejected token with access {:?}", claims.access);
            return Err(AuthError::Unauthenticated.into());
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthenticated)?;

        match self.users.find_by_token(user_id, token).await? {
            Some(user) => Ok(user),
            None => {
                debug!("Token for user {} is not live", user_id);
                Err(AuthError::Unauthenticated.into())
            }
        }
    }

    /// Signs a new token for `user`, records it and returns it.
    pub async fn generate_auth_token(&self, user: &mut User) -> Result<String> {
        let token = self.sign_token(user.id)?;
        let entry = AuthToken::auth(token.clone());

        self.users.push_token(user.id, &entry).await?;
        user.tokens.push(entry);

        Ok(token)
    }

    pub async fn remove_token(&self, user: &User, token: &str) -> Result<()> {
        self.users.pull_token(user.id, token).await
    }

    /// Replaces a pending plaintext password with its bcrypt hash. A
    /// password that is already hashed is left alone.
    pub async fn hash_password_if_modified(&self, user: &mut User) -> Result<bool> {
        let plain = match &user.password {
            Password::Plain(plain) => plain.clone(),
            Password::Hashed(_) => return Ok(false),
        };

        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
        user.password = Password::Hashed(hash);
        Ok(true)
    }

    async fn find_by_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let hash = match user.password.hash() {
            Some(hash) => hash.to_string(),
            None => return Ok(None),
        };

        let password = password.to_string();
        // bcrypt compares in constant time; a malformed stored hash counts as a mismatch.
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false)).await?;

        Ok(matches.then_some(user))
    }

    fn sign_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            access: AUTH_ACCESS.to_string(),
            exp: (now + self.token_expiry).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("token signing failed: {}", e)))
    }

    fn decode_token(&self, token: &str) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let claims = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(claims.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryStore;
    use crate::db::store::MockUserStore;
    use crate::error::DatabaseError;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test_secret".into(),
            token_expiry_hours: 1,
            bcrypt_cost: crate::config::MIN_BCRYPT_COST,
        }
    }

    fn service() -> (AuthService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (AuthService::new(store.clone(), &config()), store)
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (auth, store) = service();
        let (user, token) = auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();

        let stored = store.find_by_email("example@example.com").await.unwrap().unwrap();
        let hash = stored.password.hash().unwrap();
        assert_ne!(hash, "123abcdef");
        assert!(bcrypt::verify("123abcdef", hash).unwrap());
        assert_eq!(stored.tokens, vec![AuthToken::auth(token.clone())]);
        assert_eq!(auth.find_by_token(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (auth, store) = service();
        auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();

        let result = auth.register("Other", "example@example.com", "qwerty123").await;
        assert!(matches!(result, Err(AppError::DatabaseError(DatabaseError::Duplicate))));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_register_invalid_input_touches_no_store() {
        let mut store = MockUserStore::new();
        store.expect_insert_user().never();
        let auth = AuthService::new(Arc::new(store), &config());

        let result = auth.register("Rohit", "example@example", "123abcdef").await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_hash_only_when_modified() {
        let (auth, _) = service();
        let mut user = User::new("Rohit".into(), "example@example.com".into(), "123abcdef".into());

        assert!(auth.hash_password_if_modified(&mut user).await.unwrap());
        let first = user.password.clone();
        assert!(!auth.hash_password_if_modified(&mut user).await.unwrap());
        assert_eq!(user.password, first);

        user.password = Password::Plain("newpassword".into());
        assert!(auth.hash_password_if_modified(&mut user).await.unwrap());
        assert_ne!(user.password, first);
    }

    #[tokio::test]
    async fn test_login_appends_session() {
        let (auth, store) = service();
        let (user, first) = auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();

        let (_, second) = auth.login(" example@example.com ", "123abcdef").await.unwrap();
        assert_ne!(first, second);

        let stored = store.find_by_email("example@example.com").await.unwrap().unwrap();
        assert_eq!(stored.tokens.len(), 2);
        assert!(auth.find_by_token(&first).await.is_ok());
        assert!(auth.find_by_token(&second).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (auth, store) = service();
        let (user, _) = auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();

        let wrong_password = auth.login("example@example.com", "23456ab").await.unwrap_err();
        let unknown_user = auth.login("nobody@example.com", "123abcdef").await.unwrap_err();
        assert!(matches!(wrong_password, AppError::AuthError(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_user, AppError::AuthError(AuthError::InvalidCredentials)));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());

        let stored = store.find_by_email("example@example.com").await.unwrap().unwrap();
        assert_eq!(stored.tokens.len(), 1);
    }

    #[tokio::test]
    async fn test_logout_revokes_only_that_token() {
        let (auth, _) = service();
        let (user, first) = auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();
        let (_, second) = auth.login("example@example.com", "123abcdef").await.unwrap();

        auth.logout(&user, &first).await.unwrap();
        // revoking twice is harmless
        auth.logout(&user, &first).await.unwrap();

        assert!(matches!(
            auth.find_by_token(&first).await,
            Err(AppError::AuthError(AuthError::Unauthenticated))
        ));
        assert!(auth.find_by_token(&second).await.is_ok());
    }

    #[tokio::test]
    async fn test_tokens_signed_in_the_same_second_differ() {
        let (auth, _) = service();
        let user_id = Uuid::new_v4();

        let first = auth.sign_token(user_id).unwrap();
        let second = auth.sign_token(user_id).unwrap();
        assert_ne!(first, second);

        let first = auth.decode_token(&first).unwrap();
        let second = auth.decode_token(&second).unwrap();
        assert_eq!(first.sub, second.sub);
        assert_ne!(first.jti, second.jti);
    }

    #[tokio::test]
    async fn test_tampered_and_foreign_tokens_rejected() {
        let (auth, _) = service();
        let (_, token) = auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(auth.find_by_token(&tampered).await.is_err());
        assert!(auth.find_by_token("not-a-token").await.is_err());

        let other_secret = AuthConfig { jwt_secret: "other".into(), ..config() };
        let forged = AuthService::new(Arc::new(InMemoryStore::new()), &other_secret)
            .sign_token(Uuid::new_v4())
            .unwrap();
        assert!(auth.find_by_token(&forged).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (auth, store) = service();
        let (user, _) = auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();

        let now = Utc::now().timestamp();
        let expired = auth
            .encode_claims(&Claims {
                sub: user.id.to_string(),
                access: AUTH_ACCESS.into(),
                exp: now - 3600,
                iat: now - 7200,
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();
        store.push_token(user.id, &AuthToken::auth(expired.clone())).await.unwrap();

        assert!(auth.find_by_token(&expired).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_access_claim_rejected() {
        let (auth, store) = service();
        let (user, _) = auth.register("Rohit", "example@example.com", "123abcdef").await.unwrap();

        let now = Utc::now().timestamp();
        let reset = auth
            .encode_claims(&Claims {
                sub: user.id.to_string(),
                access: "reset".into(),
                exp: now + 3600,
                iat: now,
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();
        store.push_token(user.id, &AuthToken::auth(reset.clone())).await.unwrap();

        assert!(auth.find_by_token(&reset).await.is_err());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_masked_as_unauthenticated() {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_token()
            .returning(|_, _| Err(AppError::DatabaseError(DatabaseError::ConnectionError("down".into()))));
        let auth = AuthService::new(Arc::new(store), &config());
        let token = auth.sign_token(Uuid::new_v4()).unwrap();

        assert!(matches!(
            auth.find_by_token(&token).await,
            Err(AppError::DatabaseError(DatabaseError::ConnectionError(_)))
        ));
    }
}
