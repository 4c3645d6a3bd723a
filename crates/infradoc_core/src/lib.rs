pub mod dashboard;
pub mod domain;
pub mod gate;
pub mod library;
pub mod normalize;
pub mod ports;
pub mod upload;

pub use domain::{
    Credential, DocumentQuery, DocumentStatus, DocumentSummary, Insight, LoginGrant, Priority,
    ProcessingReport, ProcessingSummary, RecentActivity, Registration, Role, Session, UserProfile,
    UserUpdate,
};
pub use ports::{
    AuthService, DocumentService, Download, PortError, PortResult, ProcessingService,
    ProgressFn, SessionStore, UploadOptions, UploadReceipt,
};
