//! crates/infradoc_core/src/upload.rs
//!
//! Client-side upload validation and the finite upload task queue.
//!
//! Every accepted file becomes a task that moves
//! `Queued -> Uploading(p) -> Succeeded | Failed(reason)`. Aggregate progress
//! is published on a single `watch` channel; callers subscribe once instead of
//! recomputing state from the task list.

use bytes::Bytes;
use tokio::sync::watch;
use tracing::debug;

use crate::ports::UploadReceipt;

//=========================================================================================
// Files & Type Validation
//=========================================================================================

/// A file selected for upload, with the MIME type it declares.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Builds a file whose declared type comes from its extension.
    pub fn from_name(name: impl Into<String>, data: Bytes) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self::new(name, content_type, data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

const ALLOWED_EXACT: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.ms-excel",
    "application/vnd.ms-powerpoint",
];

const ALLOWED_PREFIXES: &[&str] = &[
    "text/",
    "image/",
    "application/vnd.openxmlformats-officedocument.",
];

/// PDF, office formats, plain text and images.
pub fn is_allowed_type(content_type: &str) -> bool {
    let content_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_EXACT.contains(&content_type.as_str())
        || ALLOWED_PREFIXES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
}

/// Reduces a server-supplied name to a bare file name that is safe to write
/// into the current directory. Directory parts are dropped; empty, `.` and
/// `..` names are rejected.
pub fn safe_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match base {
        "" | "." | ".." => None,
        _ if base.contains('\0') => None,
        _ => Some(base.to_string()),
    }
}

/// Declared MIME type for a file name, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Uploading(u8),
    Succeeded,
    Failed(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed(_))
    }

    fn percent(&self) -> u8 {
        match self {
            TaskState::Queued => 0,
            TaskState::Uploading(p) => *p,
            TaskState::Succeeded | TaskState::Failed(_) => 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadTask {
    pub id: usize,
    pub file: UploadFile,
    pub state: TaskState,
    pub receipt: Option<UploadReceipt>,
}

/// Aggregate view of the queue, published after every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub total: usize,
    pub queued: usize,
    pub uploading: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Name of the file currently in flight.
    pub current: Option<String>,
    /// Mean of per-task percentages; terminal tasks count as 100.
    pub percent: u8,
}

impl UploadProgress {
    pub fn is_finished(&self) -> bool {
        self.queued == 0 && self.uploading == 0
    }
}

pub struct UploadQueue {
    tasks: Vec<UploadTask>,
    next_id: usize,
    progress_tx: watch::Sender<UploadProgress>,
}

impl Default for UploadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadQueue {
    pub fn new() -> Self {
        let (progress_tx, _) = watch::channel(UploadProgress::default());
        Self {
            tasks: Vec::new(),
            next_id: 0,
            progress_tx,
        }
    }

    /// Queues every file with an allowed declared type and silently drops the
    /// rest. Returns how many were accepted.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = UploadFile>) -> usize {
        let mut accepted = 0;
        for file in files {
            if !is_allowed_type(&file.content_type) {
                debug!(file = %file.name, content_type = %file.content_type, "Skipping file with disallowed type");
                continue;
            }
            self.tasks.push(UploadTask {
                id: self.next_id,
                file,
                state: TaskState::Queued,
                receipt: None,
            });
            self.next_id += 1;
            accepted += 1;
        }
        self.publish();
        accepted
    }

    /// Removes a task that has not started yet.
    pub fn remove(&mut self, id: usize) -> Option<UploadFile> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id && t.state == TaskState::Queued)?;
        let task = self.tasks.remove(index);
        self.publish();
        Some(task.file)
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    pub fn task(&self, id: usize) -> Option<&UploadTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn queued_ids(&self) -> Vec<usize> {
        self.tasks
            .iter()
            .filter(|t| t.state == TaskState::Queued)
            .map(|t| t.id)
            .collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress_tx.subscribe()
    }

    pub fn start(&mut self, id: usize) -> bool {
        self.transition(id, |state| match state {
            TaskState::Queued => Some(TaskState::Uploading(0)),
            _ => None,
        })
    }

    /// Progress only moves forward and only while uploading.
    pub fn set_progress(&mut self, id: usize, percent: u8) -> bool {
        let percent = percent.min(100);
        self.transition(id, |state| match state {
            TaskState::Uploading(current) if percent > *current => {
                Some(TaskState::Uploading(percent))
            }
            _ => None,
        })
    }

    pub fn succeed(&mut self, id: usize, receipt: UploadReceipt) -> bool {
        let changed = self.transition(id, |state| match state {
            TaskState::Uploading(_) => Some(TaskState::Succeeded),
            _ => None,
        });
        if changed {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                task.receipt = Some(receipt);
            }
        }
        changed
    }

    pub fn fail(&mut self, id: usize, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.transition(id, move |state| match state {
            TaskState::Queued | TaskState::Uploading(_) => Some(TaskState::Failed(reason.clone())),
            _ => None,
        })
    }

    pub fn progress(&self) -> UploadProgress {
        let mut progress = UploadProgress {
            total: self.tasks.len(),
            ..UploadProgress::default()
        };
        let mut percent_sum: usize = 0;
        for task in &self.tasks {
            percent_sum += task.state.percent() as usize;
            match &task.state {
                TaskState::Queued => progress.queued += 1,
                TaskState::Uploading(_) => {
                    progress.uploading += 1;
                    progress.current = Some(task.file.name.clone());
                }
                TaskState::Succeeded => progress.succeeded += 1,
                TaskState::Failed(_) => progress.failed += 1,
            }
        }
        if progress.total > 0 {
            progress.percent = (percent_sum / progress.total) as u8;
        }
        progress
    }

    fn transition(&mut self, id: usize, next: impl Fn(&TaskState) -> Option<TaskState>) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        match next(&task.state) {
            Some(state) => {
                task.state = state;
                self.publish();
                true
            }
            None => false,
        }
    }

    fn publish(&self) {
        self.progress_tx.send_replace(self.progress());
    }
}
