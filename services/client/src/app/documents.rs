//! services/client/src/app/documents.rs
//!
//! Retrieval of the document list. The library endpoint is tried first; on
//! any failure other than a 401 the department-scoped processing listing is
//! tried once. Both paths go through the normalizer, and failures end in an
//! empty list plus a log line rather than an error.

use infradoc_core::domain::{DocumentQuery, DocumentSummary};
use infradoc_core::normalize::{EndpointFamily, Normalizer};
use infradoc_core::ports::{DocumentService, Download, PortError, PortResult, ProcessingService};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::app::session::SessionContext;

#[derive(Clone)]
pub struct DocumentFetcher {
    documents: Arc<dyn DocumentService>,
    processing: Arc<dyn ProcessingService>,
}

impl DocumentFetcher {
    pub fn new(documents: Arc<dyn DocumentService>, processing: Arc<dyn ProcessingService>) -> Self {
        Self {
            documents,
            processing,
        }
    }

    /// Fetches, normalizes and caches the list for the current session.
    /// Never fails; an empty list means nothing could be fetched.
    pub async fn fetch(
        &self,
        session: &mut SessionContext,
        query: &DocumentQuery,
    ) -> Vec<DocumentSummary> {
        let credential = session.credential();
        let department = query
            .department
            .clone()
            .or_else(|| session.profile().map(|p| p.department.clone()))
            .filter(|d| !d.trim().is_empty());

        let primary = self.documents.list_documents(&credential, query).await;
        let documents = match primary {
            Ok(records) => {
                info!(count = records.len(), "Fetched documents from the library");
                normalizer(EndpointFamily::Library, department.as_deref()).normalize_all(&records)
            }
            Err(PortError::Unauthorized(_)) => {
                session.expire();
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Library listing failed; falling back to the department listing");
                self.fallback(session, department.as_deref())
                    .await
                    .unwrap_or_default()
            }
        };

        session.cache_documents(documents.clone());
        documents
    }

    async fn fallback(
        &self,
        session: &mut SessionContext,
        department: Option<&str>,
    ) -> Option<Vec<DocumentSummary>> {
        let Some(department) = department else {
            error!("No department to fall back to; showing an empty library");
            return None;
        };
        let result = self
            .processing
            .department_documents(&session.credential(), department)
            .await;
        match session.observe(result) {
            Ok(records) => {
                info!(count = records.len(), %department, "Fetched documents from the department listing");
                Some(
                    normalizer(EndpointFamily::Processing, Some(department))
                        .normalize_all(&records),
                )
            }
            Err(e) => {
                error!(error = %e, %department, "Department listing failed; showing an empty library");
                None
            }
        }
    }

    /// Object-store entries for a department (admin only on the backend).
    pub async fn fetch_stored(
        &self,
        session: &mut SessionContext,
        department: Option<&str>,
    ) -> PortResult<Vec<DocumentSummary>> {
        let result = self
            .processing
            .storage_listing(&session.credential(), department)
            .await;
        let records = session.observe(result)?;
        Ok(normalizer(EndpointFamily::Storage, department).normalize_all(&records))
    }

    /// One document's full record. Tries the library, then the processing
    /// result, then whatever this session already fetched.
    pub async fn detail(
        &self,
        session: &mut SessionContext,
        document_id: &str,
    ) -> Option<DocumentSummary> {
        let credential = session.credential();
        let department = session.profile().map(|p| p.department.clone());

        let library = self.documents.get_document(&credential, document_id).await;
        match session.observe(library) {
            Ok(record) => {
                return Some(
                    normalizer(EndpointFamily::Library, department.as_deref()).normalize(0, &record),
                )
            }
            Err(PortError::Unauthorized(_)) => return None,
            Err(e) => warn!(error = %e, %document_id, "Library lookup failed"),
        }

        let processed = self.processing.document_result(&credential, document_id).await;
        match session.observe(processed) {
            Ok(record) => {
                return Some(
                    normalizer(EndpointFamily::Processing, department.as_deref())
                        .normalize(0, &record),
                )
            }
            Err(PortError::Unauthorized(_)) => return None,
            Err(e) => warn!(error = %e, %document_id, "Processing lookup failed; using cached copy"),
        }

        session
            .documents()
            .iter()
            .find(|doc| doc.id == document_id)
            .cloned()
    }

    /// Documents that already carry a storage URL are downloaded from there.
    pub async fn download(
        &self,
        session: &mut SessionContext,
        document: &DocumentSummary,
    ) -> PortResult<Download> {
        if let Some(url) = &document.storage_url {
            return Ok(Download::Redirect {
                url: url.clone(),
                filename: Some(document.display_name.clone()),
            });
        }
        let result = self
            .documents
            .download(&session.credential(), &document.id)
            .await;
        session.observe(result)
    }

    /// Sends an object-store entry through server-side processing.
    pub async fn process_stored(
        &self,
        session: &mut SessionContext,
        storage_key: &str,
    ) -> PortResult<()> {
        let result = self
            .processing
            .process_stored(&session.credential(), storage_key)
            .await;
        session.observe(result).map(|_| ())
    }
}

fn normalizer(family: EndpointFamily, department: Option<&str>) -> Normalizer {
    let normalizer = Normalizer::new(family);
    match department {
        Some(department) => normalizer.with_department(department),
        None => normalizer,
    }
}
