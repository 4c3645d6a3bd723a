#[cfg(feature = "dev-fallback")]
pub mod dev_login;
pub mod http;
pub mod session_file;

pub use http::HttpGateway;
pub use session_file::FileSessionStore;
