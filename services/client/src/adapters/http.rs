//! services/client/src/adapters/http.rs
//!
//! The HTTP gateway: the concrete implementation of the auth, document and
//! processing ports over the backend's REST API using `reqwest`.
//!
//! Every request goes through `send`, which attaches the bearer credential and
//! turns transport failures and non-success statuses into `PortError`s.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use infradoc_core::domain::{
    Credential, DocumentQuery, LoginGrant, ProcessingReport, ProcessingSummary, Registration,
    Role, UserProfile, UserUpdate,
};
use infradoc_core::ports::{
    AuthService, DocumentService, Download, PortError, PortResult, ProcessingService,
    ProgressFn, UploadOptions, UploadReceipt,
};
use infradoc_core::upload::{safe_file_name, UploadFile};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

/// Size of the chunks the upload body is streamed in.
const UPLOAD_CHUNK: usize = 64 * 1024;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> PortResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| PortError::Validation(format!("invalid base URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> PortResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PortError::Validation(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(builder: RequestBuilder, credential: &Credential) -> RequestBuilder {
        match credential {
            Credential::Bearer(token) => builder.bearer_auth(token),
            Credential::None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, credential: &Credential) -> PortResult<Response> {
        let request = Self::authorize(builder, credential)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "Making request");

        let response = self.client.execute(request).await.map_err(|e| {
            warn!(%method, %url, error = %e, "Request failed without a response");
            transport_error(e)
        })?;

        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "Response received");
        if status.is_success() {
            return Ok(response);
        }
        let error = error_from_response(response).await;
        warn!(%method, %url, status = status.as_u16(), error = %error, "Request rejected");
        Err(error)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        credential: &Credential,
    ) -> PortResult<T> {
        let response = self.send(builder, credential).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed response body: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        credential: &Credential,
    ) -> PortResult<T> {
        let url = self.endpoint(segments)?;
        self.send_json(self.client.get(url), credential).await
    }
}

fn transport_error(error: reqwest::Error) -> PortError {
    if error.is_decode() {
        PortError::Unexpected(error.to_string())
    } else {
        PortError::Network(error.to_string())
    }
}

/// Builds a `PortError` from a non-success response, preferring the
/// backend's `{"error": "..."}` message.
async fn error_from_response(response: Response) -> PortError {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or(fallback);
    PortError::from_status(status.as_u16(), message)
}

/// Listings come back either as a bare array or wrapped under `key`.
fn records_from(value: Value, key: &str) -> PortResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(PortError::Unexpected(format!(
                "expected '{}' to be a list, got {}",
                key, other
            ))),
        },
        other => Err(PortError::Unexpected(format!("expected a list, got {}", other))),
    }
}

fn filename_from_disposition(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("filename=")
            .and_then(|name| safe_file_name(name.trim_matches('"')))
    })
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
}

impl UserRecord {
    fn to_domain(self) -> UserProfile {
        let id = match self.id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => self.username.clone(),
        };
        let role = Role::from_label(self.role.as_deref().unwrap_or_default());
        UserProfile {
            id,
            email: self.email.unwrap_or_default(),
            role,
            department: self.department.unwrap_or_default(),
            display_name: self
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| self.username.clone()),
            username: self.username,
        }
    }
}

/// Endpoints that answer `{message, user}` or just the user record.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: UserRecord },
    Bare(UserRecord),
}

impl UserEnvelope {
    fn to_domain(self) -> UserProfile {
        match self {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user.to_domain(),
        }
    }
}

#[derive(Deserialize)]
struct LoginRecord {
    #[serde(default)]
    token: Option<String>,
    user: UserRecord,
}

#[derive(Deserialize)]
struct UploadRecord {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    s3_url: Option<String>,
    #[serde(default)]
    s3_key: Option<String>,
    #[serde(default)]
    document: Option<Value>,
}

#[derive(Deserialize)]
struct TriggerRecord {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Value,
}

#[derive(Deserialize)]
struct HealthRecord {
    #[serde(default)]
    status: Option<String>,
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpGateway {
    async fn health(&self) -> PortResult<String> {
        let record: HealthRecord = self.get_json(&["auth", "health"], &Credential::None).await?;
        Ok(record.status.unwrap_or_else(|| "unknown".to_string()))
    }

    async fn login(&self, username: &str, password: &str) -> PortResult<LoginGrant> {
        let url = self.endpoint(&["auth", "login"])?;
        let body = json!({ "username": username, "password": password });
        let record: LoginRecord = self
            .send_json(self.client.post(url).json(&body), &Credential::None)
            .await?;
        let token = record
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PortError::Unexpected("login response carried no token".to_string()))?;
        Ok(LoginGrant {
            token,
            profile: record.user.to_domain(),
        })
    }

    async fn register(&self, registration: &Registration) -> PortResult<UserProfile> {
        let url = self.endpoint(&["auth", "register"])?;
        let envelope: UserEnvelope = self
            .send_json(self.client.post(url).json(registration), &Credential::None)
            .await?;
        Ok(envelope.to_domain())
    }

    async fn logout(&self, credential: &Credential) -> PortResult<()> {
        let url = self.endpoint(&["auth", "logout"])?;
        self.send(self.client.post(url), credential).await?;
        Ok(())
    }

    async fn current_user(&self, credential: &Credential) -> PortResult<UserProfile> {
        let envelope: UserEnvelope = self.get_json(&["auth", "me"], credential).await?;
        Ok(envelope.to_domain())
    }

    async fn departments(&self) -> PortResult<Vec<String>> {
        self.get_json(&["auth", "departments"], &Credential::None).await
    }

    async fn categories(&self) -> PortResult<Vec<String>> {
        self.get_json(&["auth", "categories"], &Credential::None).await
    }

    async fn list_users(&self, credential: &Credential) -> PortResult<Vec<UserProfile>> {
        let value: Value = self.get_json(&["auth", "users"], credential).await?;
        records_from(value, "users")?
            .into_iter()
            .map(|record| {
                serde_json::from_value::<UserRecord>(record)
                    .map(UserRecord::to_domain)
                    .map_err(|e| PortError::Unexpected(format!("malformed user record: {}", e)))
            })
            .collect()
    }

    async fn update_user(
        &self,
        credential: &Credential,
        user_id: &str,
        update: &UserUpdate,
    ) -> PortResult<UserProfile> {
        let url = self.endpoint(&["auth", "users", user_id])?;
        let envelope: UserEnvelope = self
            .send_json(self.client.put(url).json(update), credential)
            .await?;
        Ok(envelope.to_domain())
    }
}

//=========================================================================================
// `DocumentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentService for HttpGateway {
    async fn list_documents(
        &self,
        credential: &Credential,
        query: &DocumentQuery,
    ) -> PortResult<Vec<Value>> {
        let url = self.endpoint(&["documents"])?;
        let value: Value = self
            .send_json(self.client.get(url).query(&query.to_pairs()), credential)
            .await?;
        records_from(value, "documents")
    }

    async fn get_document(&self, credential: &Credential, document_id: &str) -> PortResult<Value> {
        self.get_json(&["documents", document_id], credential).await
    }

    async fn download(&self, credential: &Credential, document_id: &str) -> PortResult<Download> {
        let url = self.endpoint(&["documents", document_id, "download"])?;
        let response = self.send(self.client.get(url), credential).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);

        let data = response
            .bytes()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        if is_json {
            let body: Value = serde_json::from_slice(&data)
                .map_err(|e| PortError::Unexpected(format!("malformed download body: {}", e)))?;
            let url = ["download_url", "presigned_url", "url"]
                .iter()
                .find_map(|k| body.get(*k).and_then(Value::as_str))
                .ok_or_else(|| PortError::NotFound("Download URL not available".to_string()))?;
            return Ok(Download::Redirect {
                url: url.to_string(),
                filename: body
                    .get("filename")
                    .and_then(Value::as_str)
                    .and_then(safe_file_name)
                    .or(filename),
            });
        }
        Ok(Download::Bytes { filename, data })
    }

    async fn upload(
        &self,
        credential: &Credential,
        file: &UploadFile,
        options: &UploadOptions,
        progress: ProgressFn,
    ) -> PortResult<UploadReceipt> {
        let url = self.endpoint(&["upload-s3"])?;
        let total = file.size();

        let chunks: Vec<Bytes> = (0..file.data.len())
            .step_by(UPLOAD_CHUNK)
            .map(|start| file.data.slice(start..(start + UPLOAD_CHUNK).min(file.data.len())))
            .collect();
        let reporter = progress.clone();
        let mut sent: u64 = 0;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if total > 0 {
                reporter(((sent * 100) / total) as u8);
            }
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| PortError::Validation(format!("invalid content type: {}", e)))?;

        let mut form = Form::new()
            .part("file", part)
            .text("title", file.name.clone())
            .text(
                "description",
                options
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Uploaded via infradoc - {}", chrono::Utc::now().to_rfc3339())),
            );
        if let Some(department) = &options.department {
            form = form.text("department", department.clone());
        }
        if let Some(category) = &options.category {
            form = form.text("category", category.clone());
        }

        let record: UploadRecord = self
            .send_json(self.client.post(url).multipart(form), credential)
            .await?;
        // An empty body never reaches the stream's own final report.
        if total == 0 {
            progress(100);
        }
        Ok(UploadReceipt {
            message: record
                .message
                .unwrap_or_else(|| "File uploaded successfully".to_string()),
            storage_url: record.s3_url,
            storage_key: record.s3_key,
            document: record.document,
        })
    }
}

//=========================================================================================
// `ProcessingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProcessingService for HttpGateway {
    async fn department_documents(
        &self,
        credential: &Credential,
        department: &str,
    ) -> PortResult<Vec<Value>> {
        let value: Value = self
            .get_json(&["processing", "department-documents", department], credential)
            .await?;
        records_from(value, "documents")
    }

    async fn document_result(
        &self,
        credential: &Credential,
        document_id: &str,
    ) -> PortResult<Value> {
        self.get_json(&["processing", "document", document_id], credential)
            .await
    }

    async fn trigger_processing(
        &self,
        credential: &Credential,
        department: Option<&str>,
    ) -> PortResult<ProcessingReport> {
        let url = self.endpoint(&["processing", "trigger-processing"])?;
        let body = match department {
            Some(department) => json!({ "department": department }),
            None => json!({}),
        };
        let record: TriggerRecord = self
            .send_json(self.client.post(url).json(&body), credential)
            .await?;
        Ok(ProcessingReport {
            message: record
                .message
                .unwrap_or_else(|| "Processing triggered".to_string()),
            detail: record.result,
        })
    }

    async fn processing_summary(&self, credential: &Credential) -> PortResult<ProcessingSummary> {
        self.get_json(&["processing", "documents", "summary"], credential)
            .await
    }

    async fn storage_listing(
        &self,
        credential: &Credential,
        department: Option<&str>,
    ) -> PortResult<Vec<Value>> {
        let url = self.endpoint(&["processing", "list-s3-documents"])?;
        let mut builder = self.client.get(url);
        if let Some(department) = department {
            builder = builder.query(&[("department", department)]);
        }
        let value: Value = self.send_json(builder, credential).await?;
        records_from(value, "documents")
    }

    async fn process_stored(
        &self,
        credential: &Credential,
        storage_key: &str,
    ) -> PortResult<Value> {
        let url = self.endpoint(&["processing", "process-s3-document"])?;
        self.send_json(
            self.client.post(url).json(&json!({ "s3_key": storage_key })),
            credential,
        )
        .await
    }
}
