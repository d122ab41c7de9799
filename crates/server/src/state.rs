//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Store;
use crate::notify::ScanFeed;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and the scan feed.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn Store>,
    feed: ScanFeed,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `feed` must be the feed the store's inserts are published to.
    #[must_use]
    pub fn new(config: AppConfig, store: Arc<dyn Store>, feed: ScanFeed) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                feed,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the scan notification feed.
    #[must_use]
    pub fn feed(&self) -> &ScanFeed {
        &self.inner.feed
    }
}
