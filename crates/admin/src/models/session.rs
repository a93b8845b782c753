//! Session-related types for admin authentication.

use digimart_supabase::{AdminCapability, AuthSession};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session-stored admin identity.
///
/// Pairs the auth session with the capability minted when the admin role
/// was checked at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub auth: AuthSession,
    pub capability: AdminCapability,
}

impl CurrentAdmin {
    /// Name for the sidebar.
    #[must_use]
    pub fn name(&self) -> &str {
        self.auth.user.display_name()
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.auth.user.email.as_deref().unwrap_or_default()
    }

    /// Whether the capability still belongs to the stored auth session.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.capability.matches(&self.auth)
    }
}

/// Session keys for admin data.
pub mod keys {
    /// Key for the signed-in [`super::CurrentAdmin`].
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for queued flash notifications.
    pub const FLASH: &str = "flash";
}

/// Flash notification style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A one-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Queue a flash notification for the next page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn push_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<Flash> = session.get(keys::FLASH).await?.unwrap_or_default();
    queued.push(flash);
    session.insert(keys::FLASH, queued).await
}

/// Remove and return every queued notification.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
