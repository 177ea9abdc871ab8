use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::auth::provider::IdentityProvider;

/// Authentication boundary between the engine and the identity provider.
///
/// Invariant: a token is held if and only if the gate is authenticated.
/// The gate starts unauthenticated; `init` transitions it permanently to
/// authenticated for the session when the provider resolves a token. The
/// engine never talks to the provider directly.
pub struct SessionGate {
    provider: Rc<dyn IdentityProvider>,
    token: RefCell<Option<String>>,
}

impl SessionGate {
    pub fn new(provider: Rc<dyn IdentityProvider>) -> Self {
        SessionGate {
            provider,
            token: RefCell::new(None),
        }
    }

    /// Run the provider's startup flow. Consumers must treat the gate as
    /// unauthenticated until this resolves.
    pub async fn init(&self) {
        let token = self.provider.init().await;
        if token.is_some() {
            debug!("session established");
        }
        *self.token.borrow_mut() = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    pub fn current_token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    /// Explicit user-triggered login, delegated to the provider.
    pub async fn login(&self) -> bool {
        let token = self.provider.login().await;
        let ok = token.is_some();
        *self.token.borrow_mut() = token;
        ok
    }

    /// Explicit user-triggered logout.
    pub fn logout(&self) {
        self.provider.logout();
        self.token.borrow_mut().take();
    }

    /// Invoked by the engine when the backend rejects the token mid-session.
    pub fn force_logout(&self) {
        warn!("backend rejected the session token, logging out");
        self.logout();
    }
}
