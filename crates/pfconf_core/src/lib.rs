//! # pfconf Core
//!
//! Reconciliation engine for pfconf.
//!
//! This crate provides:
//! - The desired-state record of an LDAP authentication server
//! - Identity resolution among sibling entries
//! - The reconciler: insert, sparse update or remove, with before/after diffs
//! - Sessions that load, reconcile and persist against a store
//! - Dry-run planning that never touches the caller's tree or the store

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod reconcile;
mod resolver;
mod server;
mod session;
mod types;

pub use config::{Config, DEFAULT_CONTAINER, DEFAULT_DESCRIPTION_PREFIX, DEFAULT_ENTRY_TAG};
pub use error::{CoreError, CoreResult};
pub use reconcile::{Diff, Reconciler, Reconciliation};
pub use resolver::{locate, Located};
pub use server::{LdapServer, BIND_PASSWORD_FIELD, CA_REF_FIELD, DEFAULT_CA};
pub use session::{Desired, Session};
pub use types::{Identity, ParseValueError, ProtocolVersion, SearchScope, Transport, LDAP_KIND};

/// pfconf version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
