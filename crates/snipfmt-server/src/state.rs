//! Server state.

use snipfmt_core::{Formatter, SnippetStore};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Expiring snippet store.
    pub store: SnippetStore,
    /// Formatter behind `/api/format`.
    pub formatter: Arc<dyn Formatter>,
    /// Origin used for share URLs when the request carries none.
    pub public_url: Arc<str>,
    /// Which hosted store credentials were configured, reported by the
    /// storage check.
    pub credentials: Arc<[(&'static str, bool)]>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: SnippetStore, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            store,
            formatter,
            public_url: Arc::from(snipfmt_core::config::DEFAULT_SERVER_URL),
            credentials: Arc::from(Vec::new()),
        }
    }

    /// Set the fallback public origin.
    pub fn with_public_url(mut self, url: impl AsRef<str>) -> Self {
        self.public_url = Arc::from(url.as_ref().trim_end_matches('/'));
        self
    }

    /// Record credential presence for diagnostics.
    pub fn with_credentials(
        mut self,
        credentials: impl IntoIterator<Item = (&'static str, bool)>,
    ) -> Self {
        self.credentials = credentials.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use snipfmt_core::FormatError;
    use snipfmt_storage::MemoryStorage;

    struct Identity;

    #[async_trait]
    impl Formatter for Identity {
        async fn format(&self, code: &str) -> Result<String, FormatError> {
            Ok(code.to_string())
        }
    }

    fn state() -> AppState {
        AppState::new(
            SnippetStore::new(Arc::new(MemoryStorage::new())),
            Arc::new(Identity),
        )
    }

    #[test]
    fn test_defaults() {
        let state = state();
        assert_eq!(&*state.public_url, "http://localhost:3000");
        assert!(state.credentials.is_empty());
    }

    #[test]
    fn test_public_url_trailing_slash_trimmed() {
        let state = state().with_public_url("https://snip.example.com/");
        assert_eq!(&*state.public_url, "https://snip.example.com");
    }

    #[test]
    fn test_clone_shares_backend() {
        let state = state().with_credentials([("EDGE_CONFIG", true)]);
        let cloned = state.clone();
        assert!(Arc::ptr_eq(state.store.storage(), cloned.store.storage()));
        assert_eq!(&*cloned.credentials, &[("EDGE_CONFIG", true)]);
    }
}
