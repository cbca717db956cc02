use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::optional_decimal;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl User {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    /// Any tier other than `free` counts as paying.
    pub fn is_premium(&self) -> bool {
        self.profile
            .as_ref()
            .and_then(|p| p.subscription_tier.as_deref())
            .is_some_and(|tier| !tier.eq_ignore_ascii_case("free"))
    }
}

/// Profile summary embedded in user payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub subscription_tier: Option<String>,
    #[serde(default)]
    pub resume_count: u32,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub avg_ats_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
}

/// Partial update body; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: i64,
    pub user: i64,
    pub activity_type: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: DateTime<Utc>,
}
