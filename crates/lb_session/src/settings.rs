use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::error::SessionError;

pub const DEFAULT_AUTO_LOCK_SECS: u64 = 15 * 60;

/// Longest accepted auto-lock period (one day); larger values are clamped.
pub const MAX_AUTO_LOCK_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Inactivity period after which an unlocked session locks itself.
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_lock_secs: DEFAULT_AUTO_LOCK_SECS,
        }
    }
}

impl SessionSettings {
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Effective auto-lock period. Zero is not allowed (an unlocked session
    /// always has a deadline) and falls back to the default; anything above
    /// `MAX_AUTO_LOCK_SECS` is clamped to it.
    pub fn auto_lock(&self) -> Duration {
        match self.auto_lock_secs {
            0 => Duration::from_secs(DEFAULT_AUTO_LOCK_SECS),
            secs => Duration::from_secs(secs.min(MAX_AUTO_LOCK_SECS)),
        }
    }
}

fn default_auto_lock_secs() -> u64 {
    DEFAULT_AUTO_LOCK_SECS
}
