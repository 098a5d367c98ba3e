//! Load, reconcile and persist in one call.

use crate::config::Config;
use crate::error::CoreResult;
use crate::reconcile::{Reconciler, Reconciliation};
use crate::server::LdapServer;
use crate::types::Identity;
use pfconf_tree::{ConfigStore, IdGenerator, Snapshot};
use tracing::debug;

/// A desired state together with its lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired {
    /// The server must exist with these fields.
    Present(LdapServer),
    /// No entry with this identity may exist.
    Absent(Identity),
}

impl Desired {
    /// Returns the identity the request is about.
    #[must_use]
    pub fn identity(&self) -> Identity {
        match self {
            Self::Present(server) => server.identity(),
            Self::Absent(identity) => identity.clone(),
        }
    }
}

/// Explicit context for reconciling against a store.
///
/// Each [`Session::apply`] loads a private copy of the document, runs the
/// reconciler on it and persists it only if something changed and the
/// session is not in dry-run mode.
///
/// # Example
///
/// ```rust
/// use pfconf_core::{Config, Desired, Identity, Session};
/// use pfconf_tree::InMemoryStore;
///
/// let store = InMemoryStore::parse("<pfsense><system/></pfsense>").unwrap();
/// let mut session = Session::new(store, Config::default());
/// let result = session.apply(&Desired::Absent(Identity::ldap("AD"))).unwrap();
/// assert!(!result.changed);
/// ```
#[derive(Debug)]
pub struct Session<S: ConfigStore> {
    store: S,
    reconciler: Reconciler,
}

impl<S: ConfigStore> Session<S> {
    /// Creates a session over `store`.
    #[must_use]
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            reconciler: Reconciler::new(config),
        }
    }

    /// Replaces the identifier source for new entries.
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.reconciler = self.reconciler.with_id_generator(ids);
        self
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the session and returns the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Reconciles one desired state and persists the result if needed.
    ///
    /// # Errors
    ///
    /// Returns validation errors from the reconciler and any store error
    /// from loading or persisting. Nothing is persisted on error.
    pub fn apply(&mut self, desired: &Desired) -> CoreResult<Reconciliation> {
        let mut tree = self.store.load()?;
        let result = match desired {
            Desired::Present(server) => self.reconciler.ensure_present(&mut tree, server)?,
            Desired::Absent(identity) => self.reconciler.ensure_absent(&mut tree, identity)?,
        };

        if !result.changed {
            return Ok(result);
        }
        if self.reconciler.config().dry_run {
            debug!(description = %result.description, "dry run, not persisting");
            return Ok(result);
        }

        self.store.persist(tree, &result.description)?;
        Ok(result)
    }

    /// Returns snapshots of every entry in the container, in tree order.
    ///
    /// # Errors
    ///
    /// Returns store errors from loading or a missing container.
    pub fn entries(&self) -> CoreResult<Vec<Snapshot>> {
        let config = self.reconciler.config();
        let tree = self.store.load()?;
        let container = tree.container(&config.container)?;
        Ok(container
            .children_named(&config.entry_tag)
            .map(|(_, entry)| entry.snapshot())
            .collect())
    }
}
