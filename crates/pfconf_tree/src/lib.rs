//! # pfconf Tree
//!
//! Configuration tree model and stores for pfconf.
//!
//! This crate owns everything about the configuration document itself:
//! the element model, the XML codec, loading and persisting, identifier
//! generation and certificate authority lookup. It knows nothing about
//! which entries live in the document or how they are reconciled.
//!
//! ## Design Principles
//!
//! - Child order is preserved exactly; position carries meaning
//! - Stores hand out private working copies, so uncommitted edits are
//!   never visible to other readers
//! - Stores must be `Send + Sync`
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and planning
//! - [`FileStore`] - For `config.xml` on disk, with locking and backups
//!
//! ## Example
//!
//! ```rust
//! use pfconf_tree::{ConfigTree, Node};
//!
//! let mut tree = ConfigTree::parse("<pfsense><system/></pfsense>").unwrap();
//! let system = tree.container_mut("system").unwrap();
//! system.insert_child(0, Node::with_text("hostname", "fw"));
//! assert!(tree.to_xml().unwrap().contains("<hostname>fw</hostname>"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod node;
mod store;
mod tree;
mod uniqid;
pub mod xml;

pub use error::{TreeError, TreeResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use node::{Node, Snapshot};
pub use store::{ConfigStore, DEFAULT_USERNAME};
pub use tree::{ConfigTree, CA_TAG, REVISION_TAG};
pub use uniqid::{IdGenerator, SequentialIds, UniqidGenerator};
