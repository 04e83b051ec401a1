use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{AccountType, SessionIdentity};
use crate::utils::log_throttle::should_emit;

const REDIRECT_LOG_WINDOW: Duration = Duration::from_secs(10);

/// Navigation targets used by the gate: where to send logged-out users,
/// and which home each account type lands on when it hits a view for
/// another role. Roles without an entry land on `public_home`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct RoleRoutes {
    pub login: String,
    pub public_home: String,
    #[serde(default)]
    #[schemars(with = "HashMap<String, String>")]
    pub role_homes: HashMap<AccountType, String>,
}

impl Default for RoleRoutes {
    fn default() -> Self {
        RoleRoutes {
            login: "/login".to_string(),
            public_home: "/".to_string(),
            role_homes: HashMap::from([
                (AccountType::Admin, "/admin/dashboard".to_string()),
                (AccountType::Staff, "/staff/dashboard".to_string()),
            ]),
        }
    }
}

impl RoleRoutes {
    pub fn home_for(&self, account_type: Option<&AccountType>) -> &str {
        account_type
            .and_then(|role| self.role_homes.get(role))
            .unwrap_or(&self.public_home)
    }
}

/// A navigation the caller must perform instead of mounting the view.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    /// Replace the current history entry rather than pushing a new one, so
    /// going back does not land on the guarded view again.
    pub replace: bool,
}

impl Redirect {
    fn replacing(target: &str) -> Self {
        Redirect {
            target: target.to_string(),
            replace: true,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateDecision {
    Render,
    Redirect(Redirect),
}

/// Result of [`AccessGate::guard`]: either the rendered children or the
/// redirect that replaced them.
#[derive(Debug, PartialEq)]
pub enum Gated<T> {
    Rendered(T),
    Redirected(Redirect),
}

/// Guard for a protected view.
///
/// The decision is made from `is_logged_in` and `account_type` only.
/// `is_initializing` is deliberately not consulted: until the store settles
/// every session reads as logged out and is sent to the login view.
#[derive(Debug, Clone)]
pub struct AccessGate {
    required_role: Option<AccountType>,
    routes: Arc<RoleRoutes>,
}

impl AccessGate {
    /// A gate admitting any authenticated session.
    pub fn new(routes: Arc<RoleRoutes>) -> Self {
        AccessGate {
            required_role: None,
            routes,
        }
    }

    /// Restrict the gate to sessions of exactly `role`.
    pub fn require(mut self, role: AccountType) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn required_role(&self) -> Option<&AccountType> {
        self.required_role.as_ref()
    }

    pub fn decide(&self, session: &SessionIdentity) -> GateDecision {
        if !session.is_logged_in {
            if let Some(suppressed_count) = should_emit("gate.redirect.login", REDIRECT_LOG_WINDOW)
            {
                debug!(
                    event_name = "gate.redirect.login",
                    event_domain = "gate",
                    is_initializing = session.is_initializing,
                    suppressed_count,
                    "session not logged in, redirecting to login"
                );
            }
            return GateDecision::Redirect(Redirect::replacing(&self.routes.login));
        }

        match &self.required_role {
            Some(required) if !session.has_role(required) => {
                let home = self.routes.home_for(session.account_type.as_ref());
                if let Some(suppressed_count) =
                    should_emit("gate.redirect.role_home", REDIRECT_LOG_WINDOW)
                {
                    debug!(
                        event_name = "gate.redirect.role_home",
                        event_domain = "gate",
                        required_role = required.as_str(),
                        account_type = session.account_type.as_ref().map(AccountType::as_str),
                        redirect_target = home,
                        suppressed_count,
                        "account type does not match, redirecting to role home"
                    );
                }
                GateDecision::Redirect(Redirect::replacing(home))
            }
            _ => GateDecision::Render,
        }
    }

    /// Evaluate the gate and only build the children when admitted.
    pub fn guard<T>(&self, session: &SessionIdentity, children: impl FnOnce() -> T) -> Gated<T> {
        match self.decide(session) {
            GateDecision::Render => Gated::Rendered(children()),
            GateDecision::Redirect(redirect) => Gated::Redirected(redirect),
        }
    }
}
