//! Persisted auth flag.
//!
//! The one piece of durable state: a boolean saying the operator logged in.
//! Nothing else survives a restart.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const FLAG_FILE: &str = "auth.json";

#[derive(Debug, Serialize, Deserialize)]
struct AuthFlag {
    auth: bool,
}

/// File-backed store for the auth flag.
#[derive(Debug, Clone)]
pub struct AuthFlagStore {
    path: PathBuf,
}

impl AuthFlagStore {
    /// Creates a store rooted at the given state directory.
    pub fn new(state_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = state_dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(FLAG_FILE),
        })
    }

    /// Returns whether the auth flag is set. A missing or unreadable file
    /// counts as logged out.
    pub fn load(&self) -> bool {
        let Ok(data) = fs::read_to_string(&self.path) else {
            return false;
        };
        serde_json::from_str::<AuthFlag>(&data)
            .map(|flag| flag.auth)
            .unwrap_or(false)
    }

    /// Sets the auth flag.
    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_string(&AuthFlag { auth: true })?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Clears the auth flag.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
