//! Auth backend contract and the in-process mock used for development.

use crate::identity::{AuthGrant, Identity, Role, SessionToken};
use crate::ids::UserId;
use crate::{GlycoError, GlycoResult};
use async_trait::async_trait;
use chrono::Utc;
use glyco_types::{EmailAddress, NonEmptyText};
use glyco_uuid::CanonicalId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Remote sign-in service. Implementations map their own failures onto `GlycoError`; rejected
/// credentials and registration conflicts are `GlycoError::Authentication`.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &EmailAddress, password: &str) -> GlycoResult<AuthGrant>;

    async fn register(
        &self,
        email: &EmailAddress,
        password: &str,
        name: &NonEmptyText,
    ) -> GlycoResult<AuthGrant>;

    async fn logout(&self, token: &SessionToken) -> GlycoResult<()>;
}

struct Account {
    identity: Identity,
    password: String,
}

#[derive(Default)]
struct Accounts {
    by_email: HashMap<EmailAddress, Account>,
    sessions: HashMap<SessionToken, UserId>,
}

/// Mock auth backend that resolves after a fixed delay.
///
/// Unknown emails are signed in as a new patient named after the email's local part. Known
/// emails must present the password they registered with.
pub struct MockAuthBackend {
    delay: Duration,
    accounts: Mutex<Accounts>,
}

impl MockAuthBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            accounts: Mutex::new(Accounts::default()),
        }
    }

    /// Adds an account up front, e.g. an admin for local development.
    pub fn seed_account(&self, identity: Identity, password: impl Into<String>) {
        self.lock().by_email.insert(
            identity.email.clone(),
            Account {
                identity,
                password: password.into(),
            },
        );
    }

    /// Resolves a bearer token issued by this backend.
    pub fn identity_for_token(&self, token: &SessionToken) -> Option<Identity> {
        let accounts = self.lock();
        let id = accounts.sessions.get(token)?;
        accounts
            .by_email
            .values()
            .find(|account| &account.identity.id == id)
            .map(|account| account.identity.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Accounts> {
        self.accounts.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn issue(accounts: &mut Accounts, identity: Identity) -> GlycoResult<AuthGrant> {
        let token = SessionToken::new(format!("mock-{}", CanonicalId::new()))?;
        accounts.sessions.insert(token.clone(), identity.id.clone());
        Ok(AuthGrant { identity, token })
    }
}

fn require_password(password: &str) -> GlycoResult<()> {
    if password.is_empty() {
        return Err(GlycoError::Authentication("password is required".into()));
    }
    Ok(())
}

fn new_patient(email: &EmailAddress, name: NonEmptyText) -> GlycoResult<Identity> {
    Ok(Identity {
        id: UserId::generate()?,
        email: email.clone(),
        name,
        role: Role::Patient,
        created_at: Utc::now(),
    })
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, email: &EmailAddress, password: &str) -> GlycoResult<AuthGrant> {
        tokio::time::sleep(self.delay).await;
        require_password(password)?;

        let mut accounts = self.lock();
        let existing = accounts
            .by_email
            .get(email)
            .map(|account| (account.password == password, account.identity.clone()));
        let identity = match existing {
            Some((true, identity)) => identity,
            Some((false, _)) => {
                return Err(GlycoError::Authentication(
                    "invalid email or password".into(),
                ))
            }
            None => {
                let name = NonEmptyText::new(email.local_part())?;
                let identity = new_patient(email, name)?;
                accounts.by_email.insert(
                    email.clone(),
                    Account {
                        identity: identity.clone(),
                        password: password.to_string(),
                    },
                );
                identity
            }
        };

        tracing::info!("mock login for {}", identity.id);
        Self::issue(&mut accounts, identity)
    }

    async fn register(
        &self,
        email: &EmailAddress,
        password: &str,
        name: &NonEmptyText,
    ) -> GlycoResult<AuthGrant> {
        tokio::time::sleep(self.delay).await;
        require_password(password)?;

        let mut accounts = self.lock();
        if accounts.by_email.contains_key(email) {
            return Err(GlycoError::Authentication(format!(
                "an account already exists for {}",
                email
            )));
        }

        let identity = new_patient(email, name.clone())?;
        accounts.by_email.insert(
            email.clone(),
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );

        tracing::info!("mock registration for {}", identity.id);
        Self::issue(&mut accounts, identity)
    }

    async fn logout(&self, token: &SessionToken) -> GlycoResult<()> {
        self.lock().sessions.remove(token);
        Ok(())
    }
}
