//! services/client/src/app/upload.rs
//!
//! Drives an `UploadQueue`: files are sent one at a time, then server-side
//! processing is triggered once if anything was committed. A failed trigger
//! is reported in the outcome and never undoes the uploads.

use infradoc_core::domain::ProcessingReport;
use infradoc_core::ports::{
    DocumentService, PortError, ProcessingService, ProgressFn, UploadOptions,
};
use infradoc_core::upload::{TaskState, UploadQueue, UploadTask};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::app::session::SessionContext;

pub type SharedQueue = Arc<Mutex<UploadQueue>>;

fn lock(queue: &SharedQueue) -> MutexGuard<'_, UploadQueue> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub tasks: Vec<UploadTask>,
    /// `None` when nothing succeeded and processing was not requested.
    pub processing: Option<Result<ProcessingReport, String>>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.state == TaskState::Succeeded)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t.state, TaskState::Failed(_)))
            .count()
    }
}

#[derive(Clone)]
pub struct UploadRunner {
    documents: Arc<dyn DocumentService>,
    processing: Arc<dyn ProcessingService>,
}

impl UploadRunner {
    pub fn new(documents: Arc<dyn DocumentService>, processing: Arc<dyn ProcessingService>) -> Self {
        Self {
            documents,
            processing,
        }
    }

    pub async fn run(
        &self,
        session: &mut SessionContext,
        queue: &SharedQueue,
        options: &UploadOptions,
    ) -> UploadOutcome {
        let ids = lock(queue).queued_ids();
        info!(files = ids.len(), "Starting upload batch");

        for (position, id) in ids.iter().copied().enumerate() {
            let file = {
                let mut guard = lock(queue);
                if !guard.start(id) {
                    continue;
                }
                match guard.task(id) {
                    Some(task) => task.file.clone(),
                    None => continue,
                }
            };

            let progress_queue = Arc::clone(queue);
            let progress: ProgressFn = Arc::new(move |percent| {
                lock(&progress_queue).set_progress(id, percent);
            });

            let result = self
                .documents
                .upload(&session.credential(), &file, options, progress)
                .await;
            match session.observe(result) {
                Ok(receipt) => {
                    info!(file = %file.name, key = ?receipt.storage_key, "Upload committed");
                    lock(queue).succeed(id, receipt);
                }
                Err(PortError::Unauthorized(_)) => {
                    warn!(file = %file.name, "Session rejected during upload; abandoning the batch");
                    let mut guard = lock(queue);
                    guard.fail(id, "Please login again");
                    for rest in &ids[position + 1..] {
                        guard.fail(*rest, "Please login again");
                    }
                    break;
                }
                Err(e) => {
                    error!(file = %file.name, error = %e, "Upload failed");
                    lock(queue).fail(id, e.to_string());
                }
            }
        }

        let succeeded = lock(queue).progress().succeeded;
        let processing = if succeeded > 0 && session.session().is_some() {
            let result = self
                .processing
                .trigger_processing(&session.credential(), options.department.as_deref())
                .await;
            Some(match session.observe(result) {
                Ok(report) => {
                    info!(message = %report.message, "Processing started");
                    Ok(report)
                }
                Err(e) => {
                    warn!(error = %e, "Uploads committed but processing could not be started");
                    Err(e.to_string())
                }
            })
        } else {
            None
        };

        UploadOutcome {
            tasks: lock(queue).tasks().to_vec(),
            processing,
        }
    }
}
