//! Session and view state.
//!
//! The session owns the only piece of long-lived client state: an optional
//! bearer credential. It is loaded once at startup from a
//! [`CredentialStore`], written through on login and removed on logout.
//! The active [`View`] is derived from credential presence, so exactly one
//! of the two views is current at any time.

pub mod store;

pub use store::{CredentialStore, FileStore, MemoryStore, STORAGE_KEY, StoreError};

/// Which top-level panel the client presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// No credential held: only login is possible.
    Login,
    /// Credential held: prediction, batch and insights are available.
    Application,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::Application => write!(f, "application"),
        }
    }
}

/// Credential holder bound to a persistent store.
pub struct Session {
    credential: Option<String>,
    store: Box<dyn CredentialStore>,
}

impl Session {
    /// Initialize from whatever the store currently holds.
    ///
    /// A corrupt store holds no usable credential and starts logged out.
    pub fn init(store: impl CredentialStore + 'static) -> Result<Self, StoreError> {
        let credential = match store.load() {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(StoreError::Corrupt { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            credential,
            store: Box::new(store),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// The credential to forward, if any.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn view(&self) -> View {
        if self.is_authenticated() {
            View::Application
        } else {
            View::Login
        }
    }

    /// Persist a freshly issued credential and switch to the application view.
    pub fn set_credential(&mut self, token: impl Into<String>) -> Result<View, StoreError> {
        let token = token.into();
        self.store.save(&token)?;
        self.credential = Some(token);
        Ok(self.view())
    }

    /// Forget the credential and switch to the login view.
    ///
    /// The in-memory credential is dropped even if removing the persisted
    /// copy fails.
    pub fn clear_credential(&mut self) -> Result<View, StoreError> {
        self.credential = None;
        self.store.remove()?;
        Ok(self.view())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("view", &self.view())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
