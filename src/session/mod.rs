//! View/session state machine.
//!
//! `LoggedOut → CheckingCredential → (CredentialMissing →) Dashboard ⇄
//! Generator(mode)`, with logout cutting back to `LoggedOut` from anywhere.
//! The state lives in an explicit container with named transition methods;
//! there is no ambient mutable state.

mod store;

pub use store::AuthFlagStore;

use crate::auth::CredentialVerifier;
use crate::error::{Result, StudioError};
use crate::render::Mode;

/// Authentication stage of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Not logged in.
    LoggedOut,
    /// Logged in, credential-availability check pending.
    CheckingCredential,
    /// Logged in, no usable API key connected.
    CredentialMissing,
    /// Logged in with a usable API key.
    Active,
}

/// Which screen is rendered while the session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Mode selection screen.
    Dashboard,
    /// Generator screen for the chosen mode. A generator view always
    /// carries its mode; there is no modeless generator state.
    Generator(Mode),
}

/// Session state container.
#[derive(Debug)]
pub struct Session {
    stage: Stage,
    view: View,
}

impl Session {
    /// Creates a logged-out session.
    pub fn new() -> Self {
        Self {
            stage: Stage::LoggedOut,
            view: View::Dashboard,
        }
    }

    /// Resumes from the persisted auth flag. A set flag skips the login
    /// screen but still runs the credential check.
    pub fn resume(store: &AuthFlagStore) -> Self {
        let stage = if store.load() {
            Stage::CheckingCredential
        } else {
            Stage::LoggedOut
        };
        Self {
            stage,
            view: View::Dashboard,
        }
    }

    /// Current authentication stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current view.
    pub fn view(&self) -> View {
        self.view
    }

    /// Attempts login. Success persists the auth flag and moves on to the
    /// credential check; a mismatch is an `Auth` error and changes nothing.
    pub fn login(
        &mut self,
        verifier: &dyn CredentialVerifier,
        id: &str,
        password: &str,
        store: &AuthFlagStore,
    ) -> Result<()> {
        if self.stage != Stage::LoggedOut {
            return Err(StudioError::InvalidRequest("already logged in".into()));
        }
        if !verifier.verify(id, password) {
            return Err(StudioError::Auth("Invalid ID or Password".into()));
        }
        store.save()?;
        self.stage = Stage::CheckingCredential;
        Ok(())
    }

    /// Records the outcome of the credential-availability check. Only valid
    /// while the check is pending; the gate is never evaluated outside an
    /// authenticated session.
    pub fn credential_resolved(&mut self, available: bool) -> Result<()> {
        if self.stage != Stage::CheckingCredential {
            return Err(StudioError::InvalidRequest(
                "no credential check pending".into(),
            ));
        }
        self.stage = if available {
            Stage::Active
        } else {
            tracing::warn!("no usable API key, dropping to credential-missing screen");
            Stage::CredentialMissing
        };
        Ok(())
    }

    /// Marks the credential as connected after a user-initiated key setup.
    pub fn connect_credential(&mut self) -> Result<()> {
        if self.stage != Stage::CredentialMissing {
            return Err(StudioError::InvalidRequest(
                "credential is not missing".into(),
            ));
        }
        self.stage = Stage::Active;
        Ok(())
    }

    /// Drops the connected key, e.g. after an auth failure during a render.
    pub fn reset_key(&mut self) {
        if self.stage == Stage::Active {
            self.stage = Stage::CredentialMissing;
            self.view = View::Dashboard;
        }
    }

    /// Opens the generator for the chosen mode. Only valid from the
    /// dashboard of an active session.
    pub fn select_mode(&mut self, mode: Mode) -> Result<()> {
        if self.stage != Stage::Active {
            return Err(StudioError::InvalidRequest("session is not active".into()));
        }
        if self.view != View::Dashboard {
            return Err(StudioError::InvalidRequest(
                "mode can only be selected from the dashboard".into(),
            ));
        }
        self.view = View::Generator(mode);
        Ok(())
    }

    /// Returns from the generator to the dashboard. The mode is gone once
    /// back on the dashboard.
    pub fn back(&mut self) {
        self.view = View::Dashboard;
    }

    /// Logs out from any state: clears the persisted flag, drops the
    /// credential, and resets the view to the dashboard.
    pub fn logout(&mut self, store: &AuthFlagStore) -> Result<()> {
        store.clear()?;
        self.stage = Stage::LoggedOut;
        self.view = View::Dashboard;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
