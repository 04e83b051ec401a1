// Re-exports so callers can "use crate::config::*".
pub mod backend;
pub mod logging;
pub mod storage;
pub mod types;

pub use backend::*;
pub use logging::*;
pub use storage::*;
pub use types::*;
