pub mod identity;
pub mod session_check;

pub use identity::{AccountType, Profile, SessionIdentity};
pub use session_check::{SessionCheck, SessionCheckPayload};
