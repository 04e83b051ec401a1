use serde::Deserialize;
use serde_json::Value;

use super::identity::AccountType;
use crate::utils::value::value_to_string;

/// Outcome of a session verification call, after wire decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCheck {
    pub is_logged_in: bool,
    pub user_id: Option<String>,
    pub account_type: Option<AccountType>,
}

impl SessionCheck {
    pub fn logged_in(user_id: impl Into<String>, account_type: AccountType) -> Self {
        SessionCheck {
            is_logged_in: true,
            user_id: Some(user_id.into()),
            account_type: Some(account_type),
        }
    }

    pub fn logged_out() -> Self {
        SessionCheck {
            is_logged_in: false,
            user_id: None,
            account_type: None,
        }
    }
}

/// Raw payload of the verification endpoint:
/// `{ "isLoggedIn": bool, "userId": string|number, "accountType": string }`,
/// optionally with `"success": false` and a `"message"`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionCheckPayload {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub account_type: Option<String>,
}

fn default_success() -> bool {
    true
}

impl From<SessionCheckPayload> for SessionCheck {
    fn from(payload: SessionCheckPayload) -> Self {
        let user_id = payload
            .user_id
            .filter(|v| !v.is_null())
            .map(value_to_string)
            .filter(|s| !s.is_empty());
        let account_type = payload
            .account_type
            .filter(|s| !s.is_empty())
            .map(AccountType::from);
        SessionCheck {
            is_logged_in: payload.is_logged_in,
            user_id,
            account_type,
        }
    }
}
