use std::cell::RefCell;

use async_trait::async_trait;

/// Seam for the external identity provider.
///
/// `init` runs once at startup and resolves to a token when a session can
/// be established. `login` is the explicit user-triggered flow; `logout`
/// invalidates whatever the provider holds. A real OIDC device flow would
/// implement this trait; the shipped provider hands out a static token.
#[async_trait(?Send)]
pub trait IdentityProvider {
    async fn init(&self) -> Option<String>;
    async fn login(&self) -> Option<String>;
    fn logout(&self);
}

/// Bearer-token provider backed by the config file or `TK_TOKEN`.
pub struct StaticTokenProvider {
    token: RefCell<Option<String>>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        StaticTokenProvider {
            token: RefCell::new(token),
        }
    }
}

#[async_trait(?Send)]
impl IdentityProvider for StaticTokenProvider {
    async fn init(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    async fn login(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn logout(&self) {
        self.token.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_tokens_are_treated_as_absent() {
        assert!(StaticTokenProvider::new(Some("  ".into())).init().await.is_none());
        assert!(StaticTokenProvider::new(None).init().await.is_none());
    }

    #[tokio::test]
    async fn logout_invalidates_the_token() {
        let provider = StaticTokenProvider::new(Some("tok".into()));
        assert_eq!(provider.init().await.as_deref(), Some("tok"));
        provider.logout();
        assert!(provider.login().await.is_none());
    }
}
