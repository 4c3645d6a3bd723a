//! crates/infradoc_core/src/normalize.rs
//!
//! Maps variably-shaped backend document records onto `DocumentSummary`.
//!
//! Each endpoint family has its own alias table: for every target field the
//! table lists the backend field names to try, in order. A single engine
//! applies any table and fills whatever is still missing from `DEFAULTS`, so a
//! normalized document never has an absent field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::domain::{DocumentStatus, DocumentSummary, Insight, Priority};

//=========================================================================================
// Field Tables
//=========================================================================================

/// The endpoint family a raw record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    /// `/documents` and `/documents/{id}`.
    Library,
    /// `/processing/department-documents/*` and `/processing/document/*`.
    Processing,
    /// Object-store listing entries.
    Storage,
}

/// Backend field names to try for each target field, first match wins.
#[derive(Debug)]
pub struct FieldTable {
    pub id: &'static [&'static str],
    pub storage_key: &'static [&'static str],
    pub display_name: &'static [&'static str],
    pub category: &'static [&'static str],
    pub size: &'static [&'static str],
    pub uploaded_at: &'static [&'static str],
    pub uploaded_by: &'static [&'static str],
    pub status: &'static [&'static str],
    pub summary: &'static [&'static str],
    pub priority: &'static [&'static str],
    pub tags: &'static [&'static str],
    pub department: &'static [&'static str],
    pub storage_url: &'static [&'static str],
}

pub static LIBRARY_FIELDS: FieldTable = FieldTable {
    id: &["id"],
    storage_key: &["s3_key", "key", "filename", "original_filename"],
    display_name: &["name", "title", "filename", "original_filename", "processed_filename"],
    category: &["category", "type", "file_type", "document_type"],
    size: &["size", "file_size"],
    uploaded_at: &["uploadedAt", "uploaded_at", "created_at", "updated_at", "processed_date"],
    uploaded_by: &["uploadedBy", "uploaded_by", "processed_by"],
    status: &["status"],
    summary: &["summary", "description"],
    priority: &["priority"],
    tags: &["tags"],
    department: &["department"],
    storage_url: &["s3_url", "url", "download_url", "file_path"],
};

/// Same targets as the library table with processing names first, so a
/// record carrying only one name per field normalizes identically through
/// either listing.
pub static PROCESSING_FIELDS: FieldTable = FieldTable {
    id: &["id"],
    storage_key: &["s3_key", "key", "original_filename", "filename"],
    display_name: &["original_filename", "processed_filename", "filename", "title", "name"],
    category: &["document_type", "category", "type", "file_type"],
    size: &["file_size", "size"],
    uploaded_at: &["processed_date", "created_at", "uploaded_at", "uploadedAt", "updated_at"],
    uploaded_by: &["uploaded_by", "processed_by", "uploadedBy"],
    status: &["status"],
    summary: &["summary", "description"],
    priority: &["priority"],
    tags: &["tags"],
    department: &["department"],
    storage_url: &["s3_url", "download_url", "url", "file_path"],
};

pub static STORAGE_FIELDS: FieldTable = FieldTable {
    id: &["id"],
    storage_key: &["key", "s3_key"],
    display_name: &["original_filename", "name", "key"],
    category: &["document_type", "category"],
    size: &["size", "file_size"],
    uploaded_at: &["last_modified", "processed_date"],
    uploaded_by: &["uploaded_by", "uploaded-by"],
    status: &["status"],
    summary: &["summary"],
    priority: &["priority"],
    tags: &["tags"],
    department: &["department"],
    storage_url: &["url", "s3_url"],
};

impl EndpointFamily {
    pub fn fields(&self) -> &'static FieldTable {
        match self {
            EndpointFamily::Library => &LIBRARY_FIELDS,
            EndpointFamily::Processing => &PROCESSING_FIELDS,
            EndpointFamily::Storage => &STORAGE_FIELDS,
        }
    }
}

/// Values used when no alias yields anything.
pub struct Defaults {
    pub display_name: &'static str,
    pub category: &'static str,
    pub size_label: &'static str,
    pub uploaded_by: &'static str,
    pub summary: &'static str,
    pub department: &'static str,
    pub priority: Priority,
    pub placeholder_kind: &'static str,
    pub placeholder_text: &'static str,
}

pub static DEFAULTS: Defaults = Defaults {
    display_name: "Unknown Document",
    category: "Uncategorized",
    size_label: "Unknown",
    uploaded_by: "System",
    summary: "No summary available",
    department: "unassigned",
    priority: Priority::Medium,
    placeholder_kind: "info",
    placeholder_text: "No AI insights available yet",
};

//=========================================================================================
// Normalizer
//=========================================================================================

/// Applies one family's field table to raw records.
#[derive(Debug, Clone)]
pub struct Normalizer {
    family: EndpointFamily,
    now: DateTime<Utc>,
    fallback_department: Option<String>,
}

impl Normalizer {
    pub fn new(family: EndpointFamily) -> Self {
        Self {
            family,
            now: Utc::now(),
            fallback_department: None,
        }
    }

    /// Fixes the timestamp used for records with no parseable upload time.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Department assumed for records that do not name one, typically the
    /// department the listing was scoped to.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        let department = department.into();
        if !department.trim().is_empty() {
            self.fallback_department = Some(department);
        }
        self
    }

    pub fn family(&self) -> EndpointFamily {
        self.family
    }

    pub fn normalize_all(&self, records: &[Value]) -> Vec<DocumentSummary> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| self.normalize(index, record))
            .collect()
    }

    /// Normalizes one record. `index` is its position in the listing and only
    /// feeds the synthetic id of records that have neither an id nor a key.
    pub fn normalize(&self, index: usize, record: &Value) -> DocumentSummary {
        let empty = Map::new();
        let record = record.as_object().unwrap_or(&empty);
        let fields = self.family.fields();

        let id = lookup_string(record, fields.id)
            .or_else(|| {
                lookup_string(record, fields.storage_key)
                    .map(|key| format!("s3-{}", sanitize_key(&key)))
            })
            .unwrap_or_else(|| format!("doc-{}", index));

        let display_name = lookup_string(record, fields.display_name)
            .map(|name| basename(&name).to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULTS.display_name.to_string());

        let (size_label, size_bytes) = match lookup(record, fields.size) {
            Some(Value::Number(n)) => {
                let bytes = n.as_f64().map(|f| f.max(0.0) as u64).unwrap_or(0);
                (format_size(bytes), bytes)
            }
            Some(Value::String(s)) => match s.trim().parse::<u64>() {
                Ok(bytes) => (format_size(bytes), bytes),
                Err(_) => (s.trim().to_string(), parse_size_label(s).unwrap_or(0)),
            },
            _ => (DEFAULTS.size_label.to_string(), 0),
        };

        let uploaded_at = lookup_string(record, fields.uploaded_at)
            .and_then(|raw| parse_timestamp(&raw))
            .unwrap_or(self.now);

        let status = lookup_string(record, fields.status)
            .map(|label| DocumentStatus::from_label(&label))
            .unwrap_or(DocumentStatus::Pending);

        let priority = lookup_string(record, fields.priority)
            .map(|label| Priority::from_label(&label))
            .unwrap_or(DEFAULTS.priority);

        let department = lookup_string(record, fields.department)
            .or_else(|| self.fallback_department.clone())
            .unwrap_or_else(|| DEFAULTS.department.to_string());

        let storage_url = fields
            .storage_url
            .iter()
            .filter_map(|key| record.get(*key).and_then(value_to_string))
            .find(|url| url.starts_with("http://") || url.starts_with("https://"));

        DocumentSummary {
            id,
            display_name,
            category: lookup_string(record, fields.category)
                .unwrap_or_else(|| DEFAULTS.category.to_string()),
            size_label,
            size_bytes,
            uploaded_at,
            uploaded_by: lookup_string(record, fields.uploaded_by)
                .unwrap_or_else(|| DEFAULTS.uploaded_by.to_string()),
            status,
            summary: lookup_string(record, fields.summary)
                .unwrap_or_else(|| DEFAULTS.summary.to_string()),
            insights: collect_insights(record, priority),
            tags: lookup(record, fields.tags).map(collect_tags).unwrap_or_default(),
            department,
            storage_url,
        }
    }
}

//=========================================================================================
// Field Helpers
//=========================================================================================

/// First alias whose value is present, non-null and not a blank string.
fn lookup<'a>(record: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().filter_map(|key| record.get(*key)).find(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn lookup_string(record: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(value_to_string)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

const MIB: f64 = 1024.0 * 1024.0;

pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB)
}

/// Parses labels such as `"4.2 MB"`, `"512 KB"` or `"900 B"` back into bytes.
pub fn parse_size_label(label: &str) -> Option<u64> {
    let label = label.trim();
    let split = label
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(label.len());
    let (number, unit) = label.split_at(split);
    let number: f64 = number.parse().ok()?;
    let factor = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1.0,
        "KB" | "K" => 1024.0,
        "MB" | "M" => MIB,
        "GB" | "G" => MIB * 1024.0,
        _ => return None,
    };
    Some((number * factor).round() as u64)
}

/// Accepts RFC 3339 and the offset-less ISO-8601 strings the backend emits,
/// treating the latter as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn collect_tags(value: &Value) -> BTreeSet<String> {
    let raw: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Explicit `insights` win; otherwise insights are derived from key points,
/// action items and the deadline; otherwise a single placeholder.
fn collect_insights(record: &Map<String, Value>, record_priority: Priority) -> Vec<Insight> {
    let mut insights: Vec<Insight> = match record.get("insights") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| explicit_insight(item, record_priority))
            .collect(),
        _ => Vec::new(),
    };

    if insights.is_empty() {
        let derived = [("key_points", "key_point"), ("action_items", "action")];
        for (field, kind) in derived {
            insights.extend(string_items(record.get(field)).into_iter().map(|text| Insight {
                kind: kind.to_string(),
                text,
                priority: record_priority,
            }));
        }
        if let Some(deadline) = record.get("deadline").and_then(value_to_string) {
            insights.push(Insight {
                kind: "deadline".to_string(),
                text: format!("Deadline: {}", deadline),
                priority: Priority::High,
            });
        }
    }

    if insights.is_empty() {
        insights.push(Insight {
            kind: DEFAULTS.placeholder_kind.to_string(),
            text: DEFAULTS.placeholder_text.to_string(),
            priority: Priority::Low,
        });
    }
    insights
}

fn explicit_insight(item: &Value, record_priority: Priority) -> Option<Insight> {
    match item {
        Value::Object(obj) => {
            let text = lookup_string(obj, &["text", "description", "message"])?;
            Some(Insight {
                kind: lookup_string(obj, &["type", "kind"]).unwrap_or_else(|| "note".to_string()),
                text,
                priority: lookup_string(obj, &["priority"])
                    .map(|p| Priority::from_label(&p))
                    .unwrap_or(record_priority),
            })
        }
        other => value_to_string(other).map(|text| Insight {
            kind: "note".to_string(),
            text,
            priority: record_priority,
        }),
    }
}
