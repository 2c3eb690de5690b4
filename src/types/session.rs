//! Session context supplied by the external authentication provider.
//!
//! The core never establishes or validates a session; it only reads the
//! identity tuple and the role flag. Flows take `Option<&Session>` explicitly.

use serde::{Deserialize, Serialize};

/// Role of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    #[default]
    User,
}

impl UserType {
    /// Anything other than `admin` is a regular user.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            UserType::Admin
        } else {
            UserType::User
        }
    }
}

/// Authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    /// Display name; the portal uses the login email here.
    pub user_name: String,
    pub phone_number: String,
    pub user_type: UserType,
}

impl Session {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            phone_number: user_id.clone(),
            user_id,
            user_name: user_name.into(),
            user_type: UserType::User,
        }
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = phone_number.into();
        self
    }

    pub fn admin(mut self) -> Self {
        self.user_type = UserType::Admin;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}
