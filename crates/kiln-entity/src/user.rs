//! The identity of whoever is driving the current request.

use serde::{Deserialize, Serialize};

/// The current user, recorded on administrative writes for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User identifier (`0` for anonymous/system).
    pub id: i64,
    /// Display name.
    pub name: String,
}

impl CurrentUser {
    /// Create a user identity.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The anonymous identity used by CLI runs and background work.
    pub fn anonymous() -> Self {
        Self::new(0, "anonymous")
    }
}

impl Default for CurrentUser {
    fn default() -> Self {
        Self::anonymous()
    }
}
