use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Client,
    Runner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub phone: String,
    pub name: String,
    pub role: Role,
    /// Most recent order offered to this runner, cleared once that order is
    /// claimed by anyone or observed stale.
    pub last_offered_order: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn runner(phone: &str, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phone: phone.to_string(),
            name: name.to_string(),
            role: Role::Runner,
            last_offered_order: None,
            created_at: now,
            updated_at: now,
        }
    }
}
