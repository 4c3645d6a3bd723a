//! crates/infradoc_core/src/library.rs
//!
//! Client-side filtering, searching and sorting of an already-fetched
//! document list. Nothing here performs I/O; the same input and view always
//! produce the same output in the same order.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::domain::{DocumentStatus, DocumentSummary};

/// The status tabs above the document grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusTab {
    #[default]
    All,
    Processed,
    Processing,
    /// At least one embedded insight has priority `high`.
    HighPriority,
}

impl FromStr for StatusTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusTab::All),
            "processed" => Ok(StatusTab::Processed),
            "processing" => Ok(StatusTab::Processing),
            "high" | "high-priority" => Ok(StatusTab::HighPriority),
            other => Err(format!("unknown tab '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Name,
    SizeDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "name" => Ok(SortKey::Name),
            "size" | "size-desc" => Ok(SortKey::SizeDesc),
            other => Err(format!("unknown sort '{}'", other)),
        }
    }
}

/// Local view state for the document library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryView {
    pub tab: StatusTab,
    pub department: Option<String>,
    /// Equality filter on the document category ("type").
    pub category: Option<String>,
    pub search: String,
    pub sort: SortKey,
}

impl LibraryView {
    /// The conjunction of tab, department, category and search predicates.
    pub fn matches(&self, doc: &DocumentSummary) -> bool {
        self.matches_tab(doc)
            && equals_if_set(&self.department, &doc.department)
            && equals_if_set(&self.category, &doc.category)
            && self.matches_search(doc)
    }

    fn matches_tab(&self, doc: &DocumentSummary) -> bool {
        match self.tab {
            StatusTab::All => true,
            StatusTab::Processed => doc.status == DocumentStatus::Processed,
            StatusTab::Processing => doc.status == DocumentStatus::Processing,
            StatusTab::HighPriority => doc.has_high_priority_insight(),
        }
    }

    fn matches_search(&self, doc: &DocumentSummary) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        contains(&doc.display_name)
            || contains(&doc.summary)
            || contains(&doc.category)
            || doc.tags.iter().any(|tag| contains(tag))
    }

    fn compare(&self, a: &DocumentSummary, b: &DocumentSummary) -> Ordering {
        match self.sort {
            SortKey::Newest => b.uploaded_at.cmp(&a.uploaded_at),
            SortKey::Oldest => a.uploaded_at.cmp(&b.uploaded_at),
            SortKey::Name => a
                .display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase()),
            SortKey::SizeDesc => b.size_bytes.cmp(&a.size_bytes),
        }
    }

    /// Filters and sorts `documents`. The sort is stable, so documents with
    /// equal keys keep their input order.
    pub fn apply(&self, documents: &[DocumentSummary]) -> Vec<DocumentSummary> {
        let mut selected: Vec<DocumentSummary> = documents
            .iter()
            .filter(|doc| self.matches(doc))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}

fn equals_if_set(wanted: &Option<String>, actual: &str) -> bool {
    match wanted.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(wanted) => wanted.eq_ignore_ascii_case(actual),
    }
}

/// Number shown on the high-priority tab badge: high insights across all
/// documents, not the number of documents.
pub fn high_priority_badge(documents: &[DocumentSummary]) -> usize {
    documents
        .iter()
        .map(DocumentSummary::high_priority_insight_count)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Insight, Priority};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn doc(id: &str, name: &str, day: u32, size: u64) -> DocumentSummary {
        DocumentSummary {
            id: id.to_string(),
            display_name: name.to_string(),
            category: "Engineering".to_string(),
            size_label: String::new(),
            size_bytes: size,
            uploaded_at: Utc.with_ymd_and_hms(2024, 11, day, 0, 0, 0).unwrap(),
            uploaded_by: "System".to_string(),
            status: DocumentStatus::Processed,
            summary: String::new(),
            insights: Vec::new(),
            tags: BTreeSet::new(),
            department: "engineering".to_string(),
            storage_url: None,
        }
    }

    fn insight(priority: Priority) -> Insight {
        Insight {
            kind: "safety".to_string(),
            text: "check".to_string(),
            priority,
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let docs = vec![
            doc("1", "Bridge Inspection Report.pdf", 1, 0),
            doc("2", "Payroll.xlsx", 2, 0),
        ];
        for query in ["bridge", "BRIDGE"] {
            let view = LibraryView {
                search: query.to_string(),
                ..LibraryView::default()
            };
            let ids: Vec<_> = view.apply(&docs).into_iter().map(|d| d.id).collect();
            assert_eq!(ids, vec!["1"]);
        }
    }

    #[test]
    fn search_covers_summary_category_and_tags() {
        let mut tagged = doc("1", "a.pdf", 1, 0);
        tagged.tags.insert("Maintenance".to_string());
        let mut summarized = doc("2", "b.pdf", 1, 0);
        summarized.summary = "Corrosion on support beams".to_string();
        let mut typed = doc("3", "c.pdf", 1, 0);
        typed.category = "Compliance".to_string();
        let docs = vec![tagged, summarized, typed];

        let hits = |q: &str| {
            LibraryView {
                search: q.to_string(),
                ..LibraryView::default()
            }
            .apply(&docs)
            .into_iter()
            .map(|d| d.id)
            .collect::<Vec<_>>()
        };
        assert_eq!(hits("maint"), vec!["1"]);
        assert_eq!(hits("corrosion"), vec!["2"]);
        assert_eq!(hits("COMPLIANCE"), vec!["3"]);
    }

    #[test]
    fn high_priority_tab_selects_documents_with_a_high_insight() {
        let mut urgent = doc("1", "urgent.pdf", 1, 0);
        urgent.insights = vec![insight(Priority::Low), insight(Priority::High)];
        let calm = doc("2", "calm.pdf", 2, 0);
        let view = LibraryView {
            tab: StatusTab::HighPriority,
            ..LibraryView::default()
        };
        let ids: Vec<_> = view.apply(&[urgent, calm]).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn department_and_category_filters_are_conjunctive() {
        let mut ops = doc("1", "a.pdf", 1, 0);
        ops.department = "operations".to_string();
        let eng = doc("2", "b.pdf", 1, 0);
        let mut eng_safety = doc("3", "c.pdf", 1, 0);
        eng_safety.category = "Safety".to_string();
        let view = LibraryView {
            department: Some("Engineering".to_string()),
            category: Some("engineering".to_string()),
            ..LibraryView::default()
        };
        let ids: Vec<_> = view
            .apply(&[ops, eng, eng_safety])
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn sorts_are_stable_on_ties() {
        let docs = vec![
            doc("a", "Same", 5, 10),
            doc("b", "same", 5, 10),
            doc("c", "Other", 7, 30),
            doc("d", "SAME", 5, 10),
        ];
        let order = |sort: SortKey| {
            LibraryView {
                sort,
                ..LibraryView::default()
            }
            .apply(&docs)
            .into_iter()
            .map(|d| d.id)
            .collect::<Vec<_>>()
        };
        assert_eq!(order(SortKey::Newest), vec!["c", "a", "b", "d"]);
        assert_eq!(order(SortKey::Oldest), vec!["a", "b", "d", "c"]);
        assert_eq!(order(SortKey::Name), vec!["c", "a", "b", "d"]);
        assert_eq!(order(SortKey::SizeDesc), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let mut docs = vec![
            doc("1", "Zeta report", 3, 5),
            doc("2", "alpha report", 1, 50),
            doc("3", "Beta memo", 2, 500),
        ];
        docs[0].insights = vec![insight(Priority::High)];
        docs[1].status = DocumentStatus::Processing;
        for view in [
            LibraryView {
                search: "report".to_string(),
                sort: SortKey::Name,
                ..LibraryView::default()
            },
            LibraryView {
                tab: StatusTab::Processed,
                sort: SortKey::SizeDesc,
                ..LibraryView::default()
            },
        ] {
            let once = view.apply(&docs);
            assert_eq!(view.apply(&once), once);
            assert_eq!(view.apply(&docs), once);
        }
    }

    #[test]
    fn badge_counts_insights_not_documents() {
        let mut a = doc("1", "a", 1, 0);
        a.insights = vec![insight(Priority::High), insight(Priority::High)];
        let mut b = doc("2", "b", 1, 0);
        b.insights = vec![insight(Priority::High), insight(Priority::Medium)];
        assert_eq!(high_priority_badge(&[a, b]), 3);
    }

    #[test]
    fn tab_and_sort_parse_from_cli_labels() {
        assert_eq!("high".parse::<StatusTab>(), Ok(StatusTab::HighPriority));
        assert_eq!("size".parse::<SortKey>(), Ok(SortKey::SizeDesc));
        assert!("bogus".parse::<SortKey>().is_err());
    }
}
