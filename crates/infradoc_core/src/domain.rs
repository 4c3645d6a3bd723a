//! crates/infradoc_core/src/domain.rs
//!
//! Defines the core data structures shared by the client.
//! Wire shapes live in the adapters; the types here are what the rest of the
//! application renders and reasons about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

//=========================================================================================
// Identity & Session
//=========================================================================================

/// The two roles the gate distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Maps a backend role label onto a gate role. Anything other than
    /// `admin` is treated as a regular user.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department: String,
    pub display_name: String,
}

/// Proof of authentication attached to outgoing requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credential {
    Bearer(String),
    #[default]
    None,
}

impl Credential {
    pub fn is_present(&self) -> bool {
        matches!(self, Credential::Bearer(_))
    }
}

/// Client-held proof of authentication plus the cached role and profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, profile: UserProfile) -> Self {
        Self {
            token,
            role: profile.role,
            profile,
            created_at: Utc::now(),
        }
    }

    pub fn credential(&self) -> Credential {
        Credential::Bearer(self.token.clone())
    }
}

/// What a successful login hands back.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: String,
    pub profile: UserProfile,
}

/// Payload for `register`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Partial update applied to a user by an administrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

//=========================================================================================
// Documents
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Unknown labels fall back to `Medium`, matching how the dashboards
    /// colour an unrecognised priority.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" | "urgent" | "critical" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processed,
    Processing,
    Pending,
}

impl DocumentStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "processed" | "completed" | "analyzed" => DocumentStatus::Processed,
            "processing" | "queued" => DocumentStatus::Processing,
            _ => DocumentStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processed => "processed",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Pending => "pending",
        }
    }
}

/// A short AI-generated annotation attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: String,
    pub text: String,
    pub priority: Priority,
}

/// Normalized, display-ready representation of a backend document record.
/// Every field is populated; see `normalize` for the fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub size_label: String,
    /// Byte count used for size ordering. Zero when the backend gave none.
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
    pub status: DocumentStatus,
    pub summary: String,
    pub insights: Vec<Insight>,
    pub tags: BTreeSet<String>,
    pub department: String,
    pub storage_url: Option<String>,
}

impl DocumentSummary {
    pub fn has_high_priority_insight(&self) -> bool {
        self.insights.iter().any(|i| i.priority == Priority::High)
    }

    pub fn high_priority_insight_count(&self) -> usize {
        self.insights
            .iter()
            .filter(|i| i.priority == Priority::High)
            .count()
    }
}

/// Server-side filter parameters for the document listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub department: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl DocumentQuery {
    /// Non-empty parameters as `(key, value)` pairs, in a fixed order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("department", &self.department),
            ("category", &self.category),
            ("search", &self.search),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_string()))
        })
        .collect()
    }
}

//=========================================================================================
// Processing
//=========================================================================================

/// Result of asking the backend to start its asynchronous analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingReport {
    pub message: String,
    pub detail: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecentActivity {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// Admin-wide processing statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessingSummary {
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub database_documents: u64,
    #[serde(default)]
    pub s3_documents: u64,
    #[serde(default)]
    pub by_department: std::collections::BTreeMap<String, u64>,
    #[serde(default)]
    pub recent_activity: Vec<RecentActivity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_collapse_to_user_unless_admin() {
        assert_eq!(Role::from_label("ADMIN"), Role::Admin);
        assert_eq!(Role::from_label("department"), Role::User);
        assert_eq!(Role::from_label(""), Role::User);
    }

    #[test]
    fn status_labels_from_backend_variants() {
        assert_eq!(DocumentStatus::from_label("processed"), DocumentStatus::Processed);
        assert_eq!(DocumentStatus::from_label("in_s3"), DocumentStatus::Pending);
        assert_eq!(DocumentStatus::from_label("active"), DocumentStatus::Pending);
        assert_eq!(DocumentStatus::from_label("Processing"), DocumentStatus::Processing);
    }

    #[test]
    fn query_pairs_skip_blank_values() {
        let query = DocumentQuery {
            department: Some("engineering".into()),
            category: Some("  ".into()),
            search: None,
        };
        assert_eq!(query.to_pairs(), vec![("department", "engineering".to_string())]);
    }
}
