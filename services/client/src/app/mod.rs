pub mod dashboard;
pub mod documents;
pub mod session;
pub mod state;
pub mod upload;

pub use documents::DocumentFetcher;
pub use session::SessionContext;
pub use state::AppContext;
pub use upload::{SharedQueue, UploadOutcome, UploadRunner};
