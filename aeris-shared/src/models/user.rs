use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Masked<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Masked<String>,
    #[serde(rename = "name")]
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: String, password_hash: String, display_name: String, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: Masked(normalize_email(&email)),
            password_hash: Masked(password_hash),
            display_name,
            is_admin,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Emails are unique case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
