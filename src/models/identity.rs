use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse authorization category of a session.
///
/// The backend sends plain strings. The three known roles get their own
/// variant; anything else is kept verbatim in `Other` so that it can still be
/// routed (it falls through to the public home).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum AccountType {
    Customer,
    Staff,
    Admin,
    Other(String),
}

impl AccountType {
    pub fn as_str(&self) -> &str {
        match self {
            AccountType::Customer => "customer",
            AccountType::Staff => "staff",
            AccountType::Admin => "admin",
            AccountType::Other(raw) => raw,
        }
    }
}

impl From<&str> for AccountType {
    fn from(raw: &str) -> Self {
        match raw {
            "customer" => AccountType::Customer,
            "staff" => AccountType::Staff,
            "admin" => AccountType::Admin,
            other => AccountType::Other(other.to_string()),
        }
    }
}

impl From<String> for AccountType {
    fn from(raw: String) -> Self {
        AccountType::from(raw.as_str())
    }
}

impl From<AccountType> for String {
    fn from(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile record as returned by the profile endpoint. The shape belongs to
/// the backend, so it is carried as raw JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Profile(Value);

impl Profile {
    pub fn new(value: Value) -> Self {
        Profile(value)
    }

    /// Looks up a top-level field, if the record is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(key))
    }

    /// Like [`Profile::get`] but only for string fields.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Profile {
    fn from(value: Value) -> Self {
        Profile(value)
    }
}

/// The read model held by the session store.
///
/// A logged-out identity never carries a user id, account type or profile;
/// the store only produces such states through [`SessionIdentity::clear`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub is_logged_in: bool,
    pub user_id: Option<String>,
    pub account_type: Option<AccountType>,
    pub profile: Option<Profile>,
    pub is_initializing: bool,
}

impl SessionIdentity {
    /// State of a freshly created store: unknown identity, verification pending.
    pub fn initial() -> Self {
        SessionIdentity {
            is_logged_in: false,
            user_id: None,
            account_type: None,
            profile: None,
            is_initializing: true,
        }
    }

    /// Drops every identity field. `is_initializing` is left alone.
    pub fn clear(&mut self) {
        self.is_logged_in = false;
        self.user_id = None;
        self.account_type = None;
        self.profile = None;
    }

    pub fn has_role(&self, role: &AccountType) -> bool {
        self.account_type.as_ref() == Some(role)
    }
}
