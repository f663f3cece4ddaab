//! Credential store
//!
//! Holds the operator's credential in memory, persists it under the
//! `auth-storage` namespace, mirrors it into the cookie pair and keeps the
//! dispatcher's token in step with it.

use super::cookies::{CookieJar, DEFAULT_MAX_AGE_SECS};
use super::credential::{AuthState, Credential, Role};
use super::hydration::HydrationSync;
use crate::api::{GatewayClient, UserInstance};
use crate::config::SecretString;
use crate::error::{ConsoleError, Result};
use crate::i18n::Message;
use crate::storage::{AUTH_NAMESPACE, KvStore, StorageError};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;

pub struct CredentialStore {
    client: GatewayClient,
    storage: Arc<dyn KvStore>,
    state: RwLock<AuthState>,
    cookies: Mutex<CookieJar>,
    cookie_max_age: u64,
    hydrated: watch::Sender<bool>,
}

impl CredentialStore {
    pub fn new(client: GatewayClient, storage: Arc<dyn KvStore>) -> Self {
        let (hydrated, _) = watch::channel(false);
        Self {
            client,
            storage,
            state: RwLock::new(AuthState::default()),
            cookies: Mutex::new(CookieJar::new()),
            cookie_max_age: DEFAULT_MAX_AGE_SECS,
            hydrated,
        }
    }

    pub fn with_cookie_max_age(mut self, secs: u64) -> Self {
        self.cookie_max_age = secs;
        self
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    /// Handle that waits for [`CredentialStore::rehydrate`] to finish.
    pub fn hydration(&self) -> HydrationSync {
        HydrationSync::new(self.hydrated.subscribe())
    }

    pub fn is_hydrated(&self) -> bool {
        *self.hydrated.borrow()
    }

    /// Load the persisted credential and signal that loading finished.
    ///
    /// A corrupt entry is discarded with a warning rather than failing
    /// startup. The signal is raised even when loading fails so dependents
    /// never wait forever.
    pub fn rehydrate(&self) -> Result<()> {
        let loaded = match self.storage.get::<AuthState>(AUTH_NAMESPACE) {
            Ok(state) => Ok(state.unwrap_or_default()),
            Err(StorageError::Corrupt { message, .. }) => {
                tracing::warn!("Discarding unreadable credential: {}", message);
                Ok(AuthState::default())
            }
            Err(e) => Err(e),
        };

        let result = match loaded {
            Ok(state) => {
                if let Some(credential) = state.credential() {
                    tracing::info!("Restored {} credential ({})", credential.role, credential.token.masked());
                    self.client.set_token(credential.token.clone());
                    self.lock_cookies()
                        .store_credential(&credential, self.cookie_max_age);
                }
                *self.write_state() = state;
                Ok(())
            }
            Err(e) => Err(e.into()),
        };

        self.hydrated.send_replace(true);
        result
    }

    /// Store a credential: memory, durable storage, cookies and dispatcher.
    pub fn login(&self, credential: Credential, user: Option<UserInstance>) -> Result<()> {
        let state = AuthState::authenticated(&credential, user);
        self.storage.put(AUTH_NAMESPACE, &state)?;

        self.lock_cookies()
            .store_credential(&credential, self.cookie_max_age);
        self.client.set_token(credential.token.clone());
        *self.write_state() = state;

        tracing::info!("Logged in as {} ({})", credential.role, credential.token.masked());
        Ok(())
    }

    /// Forget the credential everywhere. In-memory state is cleared even if
    /// durable storage cannot be.
    pub fn logout(&self) -> Result<()> {
        self.lock_cookies().clear_credential();
        self.client.clear_token();
        *self.write_state() = AuthState::default();

        self.storage.remove(AUTH_NAMESPACE)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// The login flow: validate `token` against the API for `role`, then
    /// [`login`](Self::login). On failure the dispatcher goes back to the
    /// previous credential (or none).
    pub async fn authenticate(
        &self,
        token: impl Into<SecretString>,
        role: Role,
    ) -> Result<Credential> {
        let credential = Credential::new(token, role);
        if credential.token.is_empty() {
            return Err(ConsoleError::NotAuthenticated(
                Message::TokenInvalid.text(self.client.locale()).to_string(),
            ));
        }

        let previous = self.token();
        self.client.set_token(credential.token.clone());

        let validation = match role {
            Role::Admin => self.client.get_users().await.map(|_| None),
            Role::Instance => self.client.session_status().await.map(Some),
        };

        let outcome = match validation {
            Ok(user) => self.login(credential.clone(), user),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(()) => Ok(credential),
            Err(e) => {
                tracing::warn!("Login as {} failed: {}", role, e);
                match previous {
                    Some(token) => self.client.set_token(token),
                    None => self.client.clear_token(),
                }
                Err(e)
            }
        }
    }

    /// Cache the instance record of the logged-in operator.
    pub fn update_user(&self, user: UserInstance) -> Result<()> {
        let state = {
            let mut state = self.write_state();
            state.user = Some(user);
            state.clone()
        };
        if state.is_authenticated {
            self.storage.put(AUTH_NAMESPACE, &state)?;
        }
        Ok(())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.read_state().credential()
    }

    pub fn token(&self) -> Option<SecretString> {
        self.credential().map(|c| c.token)
    }

    pub fn role(&self) -> Option<Role> {
        self.credential().map(|c| c.role)
    }

    pub fn user(&self) -> Option<UserInstance> {
        self.read_state().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }

    /// The credential, or a localized "not authenticated" error.
    pub fn require(&self) -> Result<Credential> {
        self.credential().ok_or_else(|| {
            ConsoleError::NotAuthenticated(
                Message::NotAuthenticated.text(self.client.locale()).to_string(),
            )
        })
    }

    /// The credential, provided it carries `role`.
    pub fn require_role(&self, role: Role) -> Result<Credential> {
        let credential = self.require()?;
        if credential.role != role {
            return Err(ConsoleError::WrongRole {
                required: role,
                actual: credential.role,
            });
        }
        Ok(credential)
    }

    /// The mirrored cookie pair as a `Cookie:` header value.
    pub fn cookie_header(&self) -> Option<String> {
        self.lock_cookies().header_value()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_cookies(&self) -> std::sync::MutexGuard<'_, CookieJar> {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner())
    }
}
