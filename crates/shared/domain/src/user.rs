//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNASSIGNED_ID;
use crate::error::DomainResult;
use crate::record::Record;
use crate::validation::require_fields;

/// User domain entity
///
/// `password` holds the encrypted secret (base64 ciphertext), never the
/// plaintext. It is serialized so cached entries round-trip losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a not-yet-persisted active user
    pub fn new(username: String, email: String, encrypted_password: String) -> Self {
        let now = Utc::now();
        Self {
            id: UNASSIGNED_ID,
            username,
            email,
            password: encrypted_password,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user has been persisted
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }
}

impl Record for User {
    type Id = i64;
    type Patch = UserPatch;

    const NAME: &'static str = "User";

    fn id(&self) -> i64 {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn merge(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial user update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Patch replacing only the encrypted secret
    pub fn password(encrypted_password: impl Into<String>) -> Self {
        Self {
            password: Some(encrypted_password.into()),
            ..Self::default()
        }
    }
}

/// Registration request (plaintext password, never persisted as-is)
#[derive(Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl CreateUser {
    /// Check that username, password and email are all present
    pub fn validate(&self) -> DomainResult<()> {
        require_fields(
            &[
                self.username.as_str(),
                self.password.as_str(),
                self.email.as_str(),
            ],
            "username, password, or email",
        )
    }
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("username", &self.username)
            .field("password", &"***")
            .field("email", &self.email)
            .finish()
    }
}
