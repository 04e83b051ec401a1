use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, IdentityBackend};
use crate::models::{AccountType, Profile, SessionIdentity};
use crate::storage::{DurableStorage, ACCOUNT_TYPE_KEY, USER_ID_KEY};

/// The identity shadow left in durable storage by the last `login`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIdentity {
    pub user_id: String,
    pub account_type: Option<AccountType>,
}

/// Owner of the client session: who the current user is, and whether we are
/// still finding out.
///
/// One store is created per application mount and handed down explicitly.
/// The backend is the source of truth; durable storage only mirrors
/// `userId` and `accountType` and is never read back into the read model.
///
/// Every identity change bumps a revision under the channel's write lock.
/// Results of backend calls only land if the revision they started from is
/// still current, so a `login`, `logout` or `set_profile` made while a call
/// is in flight always wins over its late answer.
pub struct SessionStore {
    backend: Arc<dyn IdentityBackend>,
    storage: Arc<dyn DurableStorage>,
    state: watch::Sender<SessionIdentity>,
    revision: AtomicU64,
    started: AtomicBool,
}

/// Clears `is_initializing` when dropped, so the flag settles on every exit
/// path of `initialize`, including cancellation.
struct SettleOnDrop<'a>(&'a watch::Sender<SessionIdentity>);

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|s| {
            let changed = s.is_initializing;
            s.is_initializing = false;
            changed
        });
    }
}

/// Runs a backend call, turning a panic inside it into an ordinary failure.
async fn contained<T>(
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    AssertUnwindSafe(call)
        .catch_unwind()
        .await
        .unwrap_or(Err(BackendError::Panicked))
}

impl SessionStore {
    pub fn new(backend: Arc<dyn IdentityBackend>, storage: Arc<dyn DurableStorage>) -> Self {
        let (state, _) = watch::channel(SessionIdentity::initial());
        SessionStore {
            backend,
            storage,
            state,
            revision: AtomicU64::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// Creates a store and starts its verification sequence on the runtime.
    /// Dropping the returned store (and aborting the handle) unmounts it.
    pub fn mount(
        backend: Arc<dyn IdentityBackend>,
        storage: Arc<dyn DurableStorage>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let store = Arc::new(Self::new(backend, storage));
        let task = tokio::spawn({
            let store = store.clone();
            async move { store.initialize().await }
        });
        (store, task)
    }

    /// A consistent copy of the current read model.
    pub fn snapshot(&self) -> SessionIdentity {
        self.state.borrow().clone()
    }

    /// Receives every state change; use it to re-evaluate gates once the
    /// session settles.
    pub fn subscribe(&self) -> watch::Receiver<SessionIdentity> {
        self.state.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in
    }

    pub fn is_initializing(&self) -> bool {
        self.state.borrow().is_initializing
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().user_id.clone()
    }

    pub fn account_type(&self) -> Option<AccountType> {
        self.state.borrow().account_type.clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.borrow().profile.clone()
    }

    /// Verifies the session against the backend and, when it is live, loads
    /// the profile. Only the first call on a store does anything.
    ///
    /// Never fails: any error leaves the store logged out.
    pub async fn initialize(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Session initialization already ran for this store");
            return;
        }
        let _settle = SettleOnDrop(&self.state);
        let backend = self.backend.get_name();
        let seen = self.revision.load(Ordering::SeqCst);

        let check = match contained(self.backend.verify_session()).await {
            Ok(check) if check.is_logged_in => check,
            Ok(_) => {
                info!(
                    event_name = "session.verify.logged_out",
                    event_domain = "session",
                    backend,
                    "backend reports no active session"
                );
                self.clear_if_current(seen);
                return;
            }
            Err(e) => {
                warn!(
                    event_name = "session.verify.failed",
                    event_domain = "session",
                    backend,
                    error = %e,
                    "session verification failed, treating as logged out"
                );
                self.clear_if_current(seen);
                return;
            }
        };

        let user_id = check.user_id.clone();
        let account_type = check.account_type.clone();
        let Some(verified) = self.apply_if_current(seen, |s| {
            s.is_logged_in = true;
            s.user_id = check.user_id;
            s.account_type = check.account_type;
        }) else {
            debug!("Session changed during verification, keeping local state");
            return;
        };
        info!(
            event_name = "session.verify.logged_in",
            event_domain = "session",
            backend,
            user_id = user_id.as_deref(),
            account_type = account_type.as_ref().map(AccountType::as_str),
            "session verified"
        );

        match contained(self.backend.fetch_profile()).await {
            Ok(profile) => {
                if self
                    .apply_if_current(verified, |s| s.profile = Some(profile))
                    .is_some()
                {
                    debug!("Profile loaded from '{}'", backend);
                } else {
                    debug!("Session changed during profile fetch, dropping profile");
                }
            }
            Err(e) => {
                // Login stands without a profile.
                warn!(
                    event_name = "session.profile.failed",
                    event_domain = "session",
                    backend,
                    error = %e,
                    "profile fetch failed"
                );
                self.apply_if_current(verified, |s| s.profile = None);
            }
        }
    }

    /// Records a successful sign-in performed elsewhere and mirrors the
    /// identity to durable storage. The profile is left untouched.
    pub fn login(&self, user_id: impl Into<String>, account_type: AccountType) {
        let user_id = user_id.into();
        info!(
            event_name = "session.login",
            event_domain = "session",
            user_id = user_id.as_str(),
            account_type = account_type.as_str(),
            "session logged in"
        );
        self.apply(|s| {
            self.persist(USER_ID_KEY, &user_id);
            self.persist(ACCOUNT_TYPE_KEY, account_type.as_str());
            s.is_logged_in = true;
            s.user_id = Some(user_id);
            s.account_type = Some(account_type);
        });
    }

    /// Forgets the identity locally. No remote call is made.
    pub fn logout(&self) {
        info!(
            event_name = "session.logout",
            event_domain = "session",
            "session logged out"
        );
        self.clear_session();
    }

    /// Replaces the profile wholesale. No check is made against the
    /// session, so callers that must keep a logged-out identity without a
    /// profile check `is_logged_in` first.
    pub fn set_profile(&self, profile: Option<Profile>) {
        self.apply(|s| s.profile = profile);
    }

    /// Replaces the profile only while a session is logged in. Returns
    /// whether it was applied.
    pub fn set_session_profile(&self, profile: Option<Profile>) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|s| {
            if !s.is_logged_in {
                return false;
            }
            s.profile = profile;
            self.revision.fetch_add(1, Ordering::SeqCst);
            applied = true;
            true
        });
        applied
    }

    /// What the last `login` left in durable storage, if anything. This is
    /// continuity data only and says nothing about whether the session is live.
    pub fn last_known(&self) -> Option<StoredIdentity> {
        let user_id = self.read(USER_ID_KEY)?;
        let account_type = self.read(ACCOUNT_TYPE_KEY).map(AccountType::from);
        Some(StoredIdentity {
            user_id,
            account_type,
        })
    }

    fn clear_session(&self) {
        self.apply(|s| self.wipe(s));
    }

    /// Clears the session unless something changed it since `seen`.
    fn clear_if_current(&self, seen: u64) {
        if self.apply_if_current(seen, |s| self.wipe(s)).is_none() {
            debug!("Session changed during verification, keeping local state");
        }
    }

    fn wipe(&self, s: &mut SessionIdentity) {
        self.forget(USER_ID_KEY);
        self.forget(ACCOUNT_TYPE_KEY);
        s.clear();
    }

    fn apply(&self, change: impl FnOnce(&mut SessionIdentity)) {
        self.state.send_modify(|s| {
            change(s);
            self.revision.fetch_add(1, Ordering::SeqCst);
        });
    }

    /// Applies `change` only if the revision is still `seen`.
    fn apply_if_current(
        &self,
        seen: u64,
        change: impl FnOnce(&mut SessionIdentity),
    ) -> Option<u64> {
        let mut revision = None;
        self.state.send_if_modified(|s| {
            if self.revision.load(Ordering::SeqCst) != seen {
                return false;
            }
            change(s);
            revision = Some(self.revision.fetch_add(1, Ordering::SeqCst) + 1);
            true
        });
        revision
    }

    fn read(&self, key: &str) -> Option<String> {
        if !self.storage.is_enabled() {
            return None;
        }
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read '{}' from durable storage: {}", key, e);
                None
            }
        }
    }

    fn persist(&self, key: &str, value: &str) {
        if !self.storage.is_enabled() {
            return;
        }
        if let Err(e) = self.storage.set_item(key, value) {
            error!("Could not write '{}' to durable storage: {}", key, e);
        }
    }

    fn forget(&self, key: &str) {
        if !self.storage.is_enabled() {
            return;
        }
        if let Err(e) = self.storage.remove_item(key) {
            error!("Could not remove '{}' from durable storage: {}", key, e);
        }
    }
}
