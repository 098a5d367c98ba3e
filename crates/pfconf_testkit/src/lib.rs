//! # pfconf Testkit
//!
//! Test utilities for pfconf.
//!
//! This crate provides:
//! - Sample configuration documents and preloaded stores
//! - Temporary `config.xml` files for file store tests
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pfconf_testkit::prelude::*;
//!
//! #[test]
//! fn adds_server() {
//!     let mut session = Session::new(memory_store(), Config::default());
//!     // ... apply desired states
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use pfconf_core::{Config, Desired, Identity, LdapServer, SearchScope, Session, Transport};
}

pub use fixtures::*;
pub use generators::*;
