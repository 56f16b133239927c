//! Session store: the single owner of the authenticated identity and its token.
//!
//! Every transition persists the identity/token pair as one unit before publishing the new
//! [`SessionState`], so readers never see an identity without its token (or vice versa), and
//! the completion of `login`/`register` is the point at which all readers observe the new
//! session.
//!
//! Readers either take a snapshot ([`SessionStore::state`], [`SessionStore::credential`]) or
//! subscribe to changes ([`SessionStore::subscribe`]).

use crate::auth::AuthBackend;
use crate::constants::{IDENTITY_KEY, TOKEN_KEY};
use crate::identity::{Access, AuthGrant, Credential, Identity, SessionToken, View};
use crate::storage::KeyValueStore;
use crate::{GlycoError, GlycoResult};
use glyco_types::{EmailAddress, NonEmptyText};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    /// `restore()` has not completed yet.
    #[default]
    Restoring,
    Unauthenticated,
    Authenticated(Arc<Credential>),
}

impl SessionState {
    pub fn credential(&self) -> Option<&Arc<Credential>> {
        match self {
            SessionState::Authenticated(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn is_restoring(&self) -> bool {
        matches!(self, SessionState::Restoring)
    }
}

pub struct SessionStore {
    auth: Arc<dyn AuthBackend>,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
    transition: Mutex<()>,
}

impl SessionStore {
    /// Creates a store in the `Restoring` state. Call [`SessionStore::restore`] before rendering
    /// anything that depends on the session.
    pub fn new(auth: Arc<dyn AuthBackend>, storage: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Restoring);
        Self {
            auth,
            storage,
            state,
            transition: Mutex::new(()),
        }
    }

    /// Activates a previously persisted session if one is present and well-formed.
    ///
    /// Never fails: missing, partial or malformed persisted state results in an
    /// unauthenticated session, and partial or malformed state is cleared.
    pub async fn restore(&self) -> SessionState {
        let _guard = self.transition.lock().await;

        let next = match self.read_persisted() {
            Ok(Some(credential)) => {
                tracing::info!("restored session for {}", credential.identity.id);
                SessionState::Authenticated(Arc::new(credential))
            }
            Ok(None) => SessionState::Unauthenticated,
            Err(e) => {
                tracing::warn!("ignoring persisted session: {}", e);
                if let Err(clear_err) = self.storage.remove_many(&[TOKEN_KEY, IDENTITY_KEY]) {
                    tracing::warn!("failed to clear persisted session: {}", clear_err);
                }
                SessionState::Unauthenticated
            }
        };

        self.state.send_replace(next.clone());
        next
    }

    pub async fn login(&self, email: &str, password: &str) -> GlycoResult<Identity> {
        let email = parse_email(email)?;
        let _guard = self.transition.lock().await;

        let grant = self.auth.login(&email, password).await?;
        self.activate(grant)
    }

    /// Creates an account and signs in as it. Nothing is activated if the backend refuses.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> GlycoResult<Identity> {
        let email = parse_email(email)?;
        let name = NonEmptyText::new(name)
            .map_err(|_| GlycoError::InvalidInput("name is required".into()))?;
        let _guard = self.transition.lock().await;

        let grant = self.auth.register(&email, password, &name).await?;
        self.activate(grant)
    }

    /// Signs out remotely, then clears the local session regardless of the remote outcome.
    ///
    /// Returns the remote error (if any) after the local state has been cleared.
    pub async fn logout(&self) -> GlycoResult<()> {
        let _guard = self.transition.lock().await;

        let remote_result = match self.credential() {
            Some(credential) => self.auth.logout(&credential.token).await,
            None => Ok(()),
        };
        if let Err(e) = &remote_result {
            tracing::warn!("remote sign-out failed, clearing local session anyway: {}", e);
        }

        let local_result = self.storage.remove_many(&[TOKEN_KEY, IDENTITY_KEY]);
        self.state.send_replace(SessionState::Unauthenticated);
        tracing::info!("session cleared");

        local_result?;
        remote_result
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn credential(&self) -> Option<Arc<Credential>> {
        self.state.borrow().credential().cloned()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.credential().map(|c| c.identity.clone())
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.credential().map(|c| c.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }

    /// Whether the current session may open `view`.
    pub fn can_open(&self, view: View) -> bool {
        view.access() == Access::Public || self.require(view).is_ok()
    }

    /// The active credential, if the current session may open `view`.
    pub fn require(&self, view: View) -> GlycoResult<Arc<Credential>> {
        let credential = self.credential().ok_or(GlycoError::NotAuthenticated)?;
        if !credential.identity.can_access(view) {
            return Err(GlycoError::Forbidden {
                role: credential.identity.role,
                view,
            });
        }
        Ok(credential)
    }

    fn activate(&self, grant: AuthGrant) -> GlycoResult<Identity> {
        let identity_json =
            serde_json::to_string(&grant.identity).map_err(GlycoError::Serialization)?;
        self.storage.set_many(&[
            (TOKEN_KEY, grant.token.as_str().to_string()),
            (IDENTITY_KEY, identity_json),
        ])?;

        let credential = Credential::from(grant);
        let identity = credential.identity.clone();
        self.state
            .send_replace(SessionState::Authenticated(Arc::new(credential)));
        tracing::info!("session activated for {}", identity.id);
        Ok(identity)
    }

    fn read_persisted(&self) -> GlycoResult<Option<Credential>> {
        let malformed = |e: GlycoError| GlycoError::MalformedPersistedState(e.to_string());

        let token = self.storage.get(TOKEN_KEY).map_err(malformed)?;
        let identity = self.storage.get(IDENTITY_KEY).map_err(malformed)?;

        match (token, identity) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(GlycoError::MalformedPersistedState(
                "token present without identity".into(),
            )),
            (None, Some(_)) => Err(GlycoError::MalformedPersistedState(
                "identity present without token".into(),
            )),
            (Some(token), Some(identity_json)) => {
                let token = SessionToken::new(token).map_err(malformed)?;
                let identity: Identity = serde_json::from_str(&identity_json).map_err(|e| {
                    GlycoError::MalformedPersistedState(format!("identity: {}", e))
                })?;
                Ok(Some(Credential { identity, token }))
            }
        }
    }
}

fn parse_email(email: &str) -> GlycoResult<EmailAddress> {
    EmailAddress::parse(email).map_err(|e| GlycoError::InvalidInput(e.to_string()))
}
