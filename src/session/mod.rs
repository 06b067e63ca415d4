//! Session-scoped ability provider.
//!
//! `Session` owns the current actor identity and `Ability` as one
//! atomically-replaced snapshot on a watch channel: one logical writer (the
//! auth flow), many readers (gates, guards, the render tree). Readers see a
//! whole snapshot, old or new, never a partially updated rule list.

pub mod auth;
pub mod store;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::ability::mapper;
use crate::ability::types::{Action, Subject};
use crate::ability::Ability;
use crate::errors::TillError;
use auth::{AuthError, Authenticator};
use store::{PersistedSession, SessionStore};

/// The authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Where the session is in its lifecycle. `Resolving` is the distinct
/// "identity/permissions not yet loaded" state; consumers must not render
/// it as "denied".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Resolving,
    Authenticated,
}

/// One atomically-published view of the session. The ability is shared by
/// reference; it is immutable, so readers can hold it across a render pass.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: AuthPhase,
    pub identity: Option<Identity>,
    pub ability: Arc<Ability>,
}

impl SessionSnapshot {
    fn anonymous() -> Self {
        Self {
            phase: AuthPhase::Anonymous,
            identity: None,
            ability: Arc::new(Ability::none()),
        }
    }

    fn resolving(identity: Option<Identity>) -> Self {
        Self {
            phase: AuthPhase::Resolving,
            identity,
            ability: Arc::new(Ability::none()),
        }
    }
}

pub struct Session {
    state: watch::Sender<SessionSnapshot>,
    /// Bumped on logout and on each new login attempt; an async resolve
    /// captures the epoch up front and its result is discarded if the
    /// epoch has moved by the time it lands.
    epoch: AtomicU64,
    store: Box<dyn SessionStore>,
}

impl Session {
    /// A fresh session: anonymous, deny-everything ability.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::anonymous());
        Self {
            state,
            epoch: AtomicU64::new(0),
            store,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to snapshot replacements. Consumers re-evaluate their
    /// gates on each change notification rather than polling.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Convenience subject-level check against the current ability.
    pub fn can(&self, action: Action, subject: Subject) -> bool {
        self.state.borrow().ability.can(action, subject)
    }

    /// Authenticate against the backend and install the resulting ability.
    ///
    /// Publishes a `Resolving` snapshot for the duration of the fetch. If
    /// the session is logged out (or another login starts) while the
    /// request is in flight, the result is discarded and the session is
    /// left as the later writer published it.
    pub async fn login(
        &self,
        authenticator: &dyn Authenticator,
        username: &str,
        password: &str,
    ) -> Result<Identity, TillError> {
        let epoch = self.begin_attempt(SessionSnapshot::resolving(None));
        match authenticator.login(username, password).await {
            Ok(response) => self.install(epoch, response),
            Err(err) => {
                self.publish_if_current(epoch, SessionSnapshot::anonymous());
                Err(err.into())
            }
        }
    }

    /// Re-establish a session from the persisted record, if one exists.
    ///
    /// Synchronously publishes a `Resolving` snapshot with the empty
    /// ability as a safe default, then resolves the real permissions with
    /// the authenticator. An absent record is not an error; a corrupt one
    /// is cleared and treated as "no session". A rejected credential
    /// (expired, revoked) clears the record and reverts to anonymous.
    pub async fn bootstrap(&self, authenticator: &dyn Authenticator) -> Result<(), TillError> {
        let persisted = match self.store.load() {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "clearing unreadable persisted session");
                self.store.clear()?;
                None
            }
        };
        let Some(persisted) = persisted else {
            return Ok(());
        };

        let epoch = self.begin_attempt(SessionSnapshot::resolving(Some(persisted.identity.clone())));
        match authenticator.resume(&persisted.credential).await {
            Ok(response) => {
                self.install(epoch, response)?;
                Ok(())
            }
            Err(AuthError::Rejected) => {
                if self.publish_if_current(epoch, SessionSnapshot::anonymous()) {
                    self.store.clear()?;
                }
                Ok(())
            }
            Err(err) => {
                // Backend trouble: revert to anonymous but keep the record
                // so the next launch can retry.
                self.publish_if_current(epoch, SessionSnapshot::anonymous());
                Err(err.into())
            }
        }
    }

    /// Destroy the session: invalidate any in-flight resolve, clear the
    /// persisted record, and revert to the empty ability.
    pub fn logout(&self) -> Result<(), TillError> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.clear()?;
        self.state.send_replace(SessionSnapshot::anonymous());
        tracing::info!("session cleared");
        Ok(())
    }

    fn begin_attempt(&self, snapshot: SessionSnapshot) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(snapshot);
        epoch
    }

    fn install(&self, epoch: u64, response: auth::AuthResponse) -> Result<Identity, TillError> {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::info!(
                user = %response.identity.username,
                "discarding permission fetch that resolved after the session moved on"
            );
            return Ok(response.identity);
        }

        let ability = Ability::new(mapper::rules_for_source(&response.source));
        self.store.save(&PersistedSession {
            identity: response.identity.clone(),
            credential: response.credential,
        })?;
        tracing::info!(
            user = %response.identity.username,
            rules = ability.rules().len(),
            "installed session ability"
        );
        self.state.send_replace(SessionSnapshot {
            phase: AuthPhase::Authenticated,
            identity: Some(response.identity.clone()),
            ability: Arc::new(ability),
        });
        Ok(response.identity)
    }

    fn publish_if_current(&self, epoch: u64, snapshot: SessionSnapshot) -> bool {
        if self.epoch.load(Ordering::SeqCst) == epoch {
            self.state.send_replace(snapshot);
            true
        } else {
            false
        }
    }
}
