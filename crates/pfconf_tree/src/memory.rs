//! In-memory configuration store for testing.

use crate::error::TreeResult;
use crate::store::{unix_now, ConfigStore, DEFAULT_USERNAME};
use crate::tree::ConfigTree;
use parking_lot::RwLock;
use tracing::info;

/// An in-memory configuration store.
///
/// Suitable for unit tests, integration tests and planning runs that
/// never touch the disk. Every successful `persist` is recorded so
/// tests can assert on what would have been committed.
///
/// # Example
///
/// ```rust
/// use pfconf_tree::{ConfigStore, InMemoryStore};
///
/// let mut store = InMemoryStore::parse("<pfsense><system/></pfsense>").unwrap();
/// let tree = store.load().unwrap();
/// store.persist(tree, "no-op").unwrap();
/// assert_eq!(store.history(), vec!["no-op".to_string()]);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    tree: RwLock<ConfigTree>,
    history: RwLock<Vec<String>>,
    username: String,
}

impl InMemoryStore {
    /// Creates a store holding `tree`.
    #[must_use]
    pub fn new(tree: ConfigTree) -> Self {
        Self {
            tree: RwLock::new(tree),
            history: RwLock::new(Vec::new()),
            username: DEFAULT_USERNAME.to_string(),
        }
    }

    /// Creates a store from an XML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is invalid.
    pub fn parse(xml: &str) -> TreeResult<Self> {
        ConfigTree::parse(xml).map(Self::new)
    }

    /// Sets the username recorded in revision stamps.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Returns a copy of the stored document.
    #[must_use]
    pub fn tree(&self) -> ConfigTree {
        self.tree.read().clone()
    }

    /// Returns the change descriptions of every persist, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.read().clone()
    }
}

impl ConfigStore for InMemoryStore {
    fn load(&self) -> TreeResult<ConfigTree> {
        Ok(self.tree.read().clone())
    }

    fn persist(&mut self, mut tree: ConfigTree, description: &str) -> TreeResult<()> {
        tree.stamp_revision(description, &self.username, unix_now());
        *self.tree.write() = tree;
        self.history.write().push(description.to_string());
        info!(description, "persisted configuration in memory");
        Ok(())
    }
}
