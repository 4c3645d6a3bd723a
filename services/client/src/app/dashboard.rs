//! services/client/src/app/dashboard.rs
//!
//! Loads what the admin and department dashboards render. Every piece is
//! optional except the document counts, which fall back to zero.

use infradoc_core::dashboard::{recent, DocumentStats, UserStats};
use infradoc_core::domain::{DocumentQuery, DocumentSummary, ProcessingSummary};
use tracing::warn;

use crate::app::session::SessionContext;
use crate::app::state::AppContext;

const RECENT: usize = 5;

#[derive(Debug, Clone)]
pub struct AdminOverview {
    pub documents: DocumentStats,
    pub users: Option<UserStats>,
    pub processing: Option<ProcessingSummary>,
    pub recent: Vec<DocumentSummary>,
}

#[derive(Debug, Clone)]
pub struct DepartmentOverview {
    pub department: String,
    pub documents: DocumentStats,
    pub recent: Vec<DocumentSummary>,
}

pub async fn admin_overview(ctx: &AppContext, session: &mut SessionContext) -> AdminOverview {
    let documents = ctx.fetcher().fetch(session, &DocumentQuery::default()).await;

    let users = if session.session().is_some() {
        let result = ctx.auth.list_users(&session.credential()).await;
        match session.observe(result) {
            Ok(users) => Some(UserStats::from_users(&users)),
            Err(e) => {
                warn!(error = %e, "User list unavailable");
                None
            }
        }
    } else {
        None
    };

    let processing = if session.session().is_some() {
        let result = ctx.processing.processing_summary(&session.credential()).await;
        match session.observe(result) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %e, "Processing summary unavailable");
                None
            }
        }
    } else {
        None
    };

    AdminOverview {
        documents: DocumentStats::from_documents(&documents),
        users,
        processing,
        recent: recent(&documents, RECENT).into_iter().cloned().collect(),
    }
}

pub async fn department_overview(
    ctx: &AppContext,
    session: &mut SessionContext,
) -> DepartmentOverview {
    let department = session
        .profile()
        .map(|p| p.department.clone())
        .unwrap_or_default();
    let query = DocumentQuery {
        department: Some(department.clone()).filter(|d| !d.is_empty()),
        ..DocumentQuery::default()
    };
    let documents = ctx.fetcher().fetch(session, &query).await;
    DepartmentOverview {
        department,
        documents: DocumentStats::from_documents(&documents),
        recent: recent(&documents, RECENT).into_iter().cloned().collect(),
    }
}
