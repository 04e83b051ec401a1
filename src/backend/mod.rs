pub mod base;
pub mod http_backend;

pub use base::{create_backend, BackendError, IdentityBackend};
pub use http_backend::HttpIdentityBackend;
