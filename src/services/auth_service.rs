use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::AppError;
use crate::models::{AccessToken, NewUser, SignupRequest, TokenPair, User};
use crate::services::chat_service::Caller;
use crate::store::UserStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Account creation and HS256 token issuance
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            users,
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User, AppError> {
        let username = request.username.as_deref().unwrap_or_default();
        let password = request.password.as_deref().unwrap_or_default();

        // Usernames are stored exactly as sent; whitespace-only ones are rejected.
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("Username and password are required.".into()));
        }

        if self.users.username_exists(username).await? {
            return Err(duplicate_username());
        }

        let user = self
            .users
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash: hash_password(password)?,
                preferred_model: request.preferred_model.unwrap_or_default(),
            })
            .await
            .map_err(|e| match e {
                // A concurrent signup can win between the existence check and the insert.
                sqlx::Error::Database(db) if db.is_unique_violation() => duplicate_username(),
                other => AppError::Db(other),
            })?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn obtain_tokens(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash) {
            warn!("Rejected credentials for {}", username);
            return Err(AppError::Unauthorized);
        }

        Ok(TokenPair {
            access: self.issue(&user.id, &user.username, TokenType::Access)?,
            refresh: self.issue(&user.id, &user.username, TokenType::Refresh)?,
        })
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AppError> {
        let claims = self.decode_claims(refresh_token, TokenType::Refresh)?;
        Ok(AccessToken {
            access: self.issue(&claims.sub, &claims.username, TokenType::Access)?,
        })
    }

    /// Resolves a bearer access token to the user it was issued for.
    pub async fn authenticate(&self, access_token: &str) -> Result<Caller, AppError> {
        let claims = self.decode_claims(access_token, TokenType::Access)?;
        let user = self
            .users
            .find_user_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(Caller {
            id: user.id,
            username: user.username,
        })
    }

    fn issue(&self, user_id: &Uuid, username: &str, token_type: TokenType) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.config.access_ttl,
            TokenType::Refresh => self.config.refresh_ttl,
        };
        let claims = Claims {
            sub: *user_id,
            username: username.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    fn decode_claims(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!("Token rejected: {}", e);
            AppError::Unauthorized
        })?;

        if data.claims.token_type != expected {
            return Err(AppError::Unauthorized);
        }
        Ok(data.claims)
    }
}

fn duplicate_username() -> AppError {
    AppError::Conflict("Username already exists.".into())
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}
