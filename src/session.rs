//! Saved login session, so repeated reports skip the login round-trip.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Sessions older than this are discarded on load.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub token: String,
    pub student_id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: &str, token: &str, student_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            token: token.to_string(),
            student_id: student_id.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::hours(SESSION_TTL_HOURS)
    }

    /// Writes the session as JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating session directory {}", parent.display()))?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("writing session to {}", path.display()))?;
        info!(path = %path.display(), "Session saved");
        Ok(())
    }

    /// Loads a live session. Missing or unreadable files yield `None`;
    /// expired sessions are deleted and also yield `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        Self::load_at(path, Utc::now())
    }

    pub fn load_at(path: &Path, now: DateTime<Utc>) -> Result<Option<Self>> {
        let Ok(content) = fs::read_to_string(path) else {
            return Ok(None);
        };

        let session: Session = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable session");
                return Ok(None);
            }
        };

        if session.is_expired_at(now) {
            info!(user_id = %session.user_id, "Session expired");
            Self::clear(path)?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Removes the saved session, if any.
    pub fn clear(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("removing session {}", path.display()))?;
        }
        Ok(())
    }
}
