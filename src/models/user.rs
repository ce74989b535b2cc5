use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered account. `password_hash` is an argon2 PHC string and never leaves the backend.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub preferred_model: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub preferred_model: PreferredModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PreferredModel {
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[default]
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
}

impl PreferredModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredModel::Gpt4 => "gpt-4",
            PreferredModel::Gemini25Flash => "gemini-2.5-flash",
        }
    }
}

impl fmt::Display for PreferredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferredModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt-4" => Ok(PreferredModel::Gpt4),
            "gemini-2.5-flash" => Ok(PreferredModel::Gemini25Flash),
            other => Err(format!("Unknown preferred model: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub preferred_model: Option<PreferredModel>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}
