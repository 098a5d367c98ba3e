//! Configuration store trait definition.

use crate::error::TreeResult;
use crate::tree::ConfigTree;
use std::time::{SystemTime, UNIX_EPOCH};

/// Username recorded in revision stamps when none is configured.
pub const DEFAULT_USERNAME: &str = "pfconf";

/// Durable home of a configuration document.
///
/// A store hands out independent copies of the document and accepts a
/// whole modified document back. Callers mutate their copy freely; nothing
/// is visible to other readers of the store until `persist` succeeds.
///
/// # Invariants
///
/// - `load` returns the document as of the last successful `persist`
/// - `persist` stamps the revision with `description` before writing
/// - A failed `persist` leaves the previously stored document intact
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For `config.xml` on disk
pub trait ConfigStore: Send + Sync {
    /// Loads a private working copy of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    fn load(&self) -> TreeResult<ConfigTree>;

    /// Commits `tree` as the new stored document, tagged with a
    /// human-readable change description.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn persist(&mut self, tree: ConfigTree, description: &str) -> TreeResult<()>;
}

/// Current time in whole seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    unix_now_micros() / 1_000_000
}

/// Current time in microseconds since the Unix epoch.
pub(crate) fn unix_now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_micros()).ok())
        .unwrap_or(0)
}
