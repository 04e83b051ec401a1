pub mod store;

pub use store::{SessionStore, StoredIdentity};
