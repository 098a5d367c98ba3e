//! CLI command implementations.

pub mod ldap;
pub mod list;

use pfconf_core::BIND_PASSWORD_FIELD;
use pfconf_tree::Snapshot;
use thiserror::Error;

/// Placeholder printed instead of secrets.
pub const MASK: &str = "********";

/// Errors raised by the front end before the engine runs.
#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments required by the requested state were not given.
    #[error("state is {state} but all of the following are missing: {missing}")]
    MissingArguments {
        /// Requested lifecycle state.
        state: &'static str,
        /// Comma-separated argument names.
        missing: String,
    },

    /// An argument value is not accepted.
    #[error("invalid value for --{argument}: {message}")]
    InvalidArgument {
        /// Argument name.
        argument: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Replaces non-empty secrets in a snapshot with [`MASK`].
pub fn mask_secrets(snapshot: &mut Snapshot) {
    if let Some(value) = snapshot.get_mut(BIND_PASSWORD_FIELD) {
        if !value.is_empty() {
            *value = MASK.to_string();
        }
    }
}
