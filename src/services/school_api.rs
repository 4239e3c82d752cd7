//! Trait and types for talking to the school-records API.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Body sent to the login endpoint. `ident` is always null for students.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub ident: Option<&'a str>,
    pub pass: &'a str,
    pub uid: &'a str,
}

/// Fields of the login response the rest of the crate uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub ident: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub expire: Option<String>,
}

impl LoginResponse {
    /// The session token, if upstream returned a non-empty one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Abstraction over the upstream school-records provider.
#[async_trait::async_trait]
pub trait SchoolApi: Send + Sync {
    /// Authenticates a student and returns the session token.
    async fn login(&self, uid: &str, pass: &str) -> Result<LoginResponse>;

    /// Fetches the raw grades payload for `student_id`. The payload's
    /// `grades` field is what the aggregator consumes.
    async fn grades(&self, student_id: &str, token: &str) -> Result<serde_json::Value>;
}

/// Extracts the numeric student id from a login user id (`S1234567X` → `1234567`).
pub fn student_id(uid: &str) -> String {
    uid.chars().filter(char::is_ascii_digit).collect()
}
