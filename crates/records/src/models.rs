//! Record types for the Stride application tables

use serde::{Deserialize, Serialize};

fn default_success_rate() -> String {
    "0%".to_string()
}

/// One row of the `profiles` table
///
/// The row is keyed by the identity provider's subject id. Aggregate
/// counters are denormalized and recomputed by backend jobs; clients treat
/// them as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub goals_completed: i64,
    #[serde(default)]
    pub days_active: i64,
    #[serde(default = "default_success_rate")]
    pub success_rate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Build a profile holding only identity-derived fields
    ///
    /// Used while the full row is still in flight; consumers must tolerate
    /// the default-valued remainder.
    pub fn placeholder(id: &str, email: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            email: email.unwrap_or_default().to_string(),
            interests: Vec::new(),
            bio: String::new(),
            goals_completed: 0,
            days_active: 0,
            success_rate: default_success_rate(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Insert payload for the `profiles` table
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub interests: Vec<String>,
    pub bio: String,
    pub goals_completed: i64,
    pub days_active: i64,
    pub success_rate: String,
}

impl NewProfile {
    /// A fresh profile with default field values
    pub fn with_defaults(id: &str, name: &str, email: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            interests: Vec::new(),
            bio: String::new(),
            goals_completed: 0,
            days_active: 0,
            success_rate: default_success_rate(),
        }
    }
}

/// One row of the `dashboard_stats` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub user_id: String,
    #[serde(default)]
    pub active_goals: i64,
    #[serde(default)]
    pub completed_goals: i64,
    #[serde(default)]
    pub partner_count: i64,
    #[serde(default)]
    pub streak_days: i64,
}

impl DashboardStats {
    /// The all-zero row inserted at registration
    pub fn zeroed(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            active_goals: 0,
            completed_goals: 0,
            partner_count: 0,
            streak_days: 0,
        }
    }
}

/// Goal lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "missed")]
    Missed,
}

/// One row of the `goals` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub due_date: String,
    #[serde(default)]
    pub progress: i64,
    pub status: GoalStatus,
}
