//! Engine configuration.

/// Default container holding authentication servers.
pub const DEFAULT_CONTAINER: &str = "system";
/// Default tag of authentication server entries.
pub const DEFAULT_ENTRY_TAG: &str = "authserver";
/// Default prefix of change descriptions.
pub const DEFAULT_DESCRIPTION_PREFIX: &str = "pfconf";

/// Configuration for a reconciliation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Top-level container whose children are scanned.
    pub container: String,

    /// Tag of the entries being reconciled.
    pub entry_tag: String,

    /// Compute the change but leave the caller's tree and the store untouched.
    pub dry_run: bool,

    /// Prefix of the change description recorded on persist.
    pub description_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            entry_tag: DEFAULT_ENTRY_TAG.to_string(),
            dry_run: false,
            description_prefix: DEFAULT_DESCRIPTION_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the container tag.
    #[must_use]
    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.container = name.into();
        self
    }

    /// Sets the entry tag.
    #[must_use]
    pub fn entry_tag(mut self, tag: impl Into<String>) -> Self {
        self.entry_tag = tag.into();
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    /// Sets the change description prefix.
    #[must_use]
    pub fn description_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.description_prefix = prefix.into();
        self
    }
}
