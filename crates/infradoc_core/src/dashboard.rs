//! crates/infradoc_core/src/dashboard.rs
//!
//! Aggregate counts rendered on the admin, department and user dashboards.

use std::collections::BTreeMap;

use crate::domain::{DocumentStatus, DocumentSummary, Role, UserProfile};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub total: usize,
    pub processed: usize,
    pub processing: usize,
    pub pending: usize,
    /// Documents carrying at least one high-priority insight.
    pub high_priority_documents: usize,
    /// High-priority insights across all documents.
    pub high_priority_insights: usize,
    /// Documents with an object-store URL.
    pub stored: usize,
    pub by_department: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
}

impl DocumentStats {
    pub fn from_documents(documents: &[DocumentSummary]) -> Self {
        documents.iter().fold(Self::default(), |mut stats, doc| {
            stats.total += 1;
            match doc.status {
                DocumentStatus::Processed => stats.processed += 1,
                DocumentStatus::Processing => stats.processing += 1,
                DocumentStatus::Pending => stats.pending += 1,
            }
            let high = doc.high_priority_insight_count();
            if high > 0 {
                stats.high_priority_documents += 1;
            }
            stats.high_priority_insights += high;
            if doc.storage_url.is_some() {
                stats.stored += 1;
            }
            *stats.by_department.entry(doc.department.clone()).or_default() += 1;
            *stats.by_category.entry(doc.category.clone()).or_default() += 1;
            stats
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub admins: usize,
    pub by_department: BTreeMap<String, usize>,
}

impl UserStats {
    pub fn from_users(users: &[UserProfile]) -> Self {
        users.iter().fold(Self::default(), |mut stats, user| {
            stats.total += 1;
            if user.role == Role::Admin {
                stats.admins += 1;
            }
            *stats.by_department.entry(user.department.clone()).or_default() += 1;
            stats
        })
    }
}

/// The `n` most recently uploaded documents, newest first.
pub fn recent(documents: &[DocumentSummary], n: usize) -> Vec<&DocumentSummary> {
    let mut sorted: Vec<&DocumentSummary> = documents.iter().collect();
    sorted.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    sorted.truncate(n);
    sorted
}
