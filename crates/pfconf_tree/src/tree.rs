//! Loaded configuration document.

use crate::error::{TreeError, TreeResult};
use crate::node::Node;
use crate::xml;
use tracing::debug;

/// Tag of top-level certificate authority entries.
pub const CA_TAG: &str = "ca";
/// Tag of the revision stamp written on every persist.
pub const REVISION_TAG: &str = "revision";

/// An in-memory configuration document.
///
/// `ConfigTree` owns the root element and exposes the lookups the
/// reconciliation engine needs: named containers, certificate authority
/// references and revision stamping. Cloning produces an independent
/// working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTree {
    root: Node,
}

impl ConfigTree {
    /// Wraps an existing root node.
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is invalid.
    pub fn parse(xml: &str) -> TreeResult<Self> {
        xml::parse(xml).map(Self::new)
    }

    /// Serialises the document back to XML.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn to_xml(&self) -> TreeResult<String> {
        xml::to_string(&self.root)
    }

    /// Returns the root element.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the root element mutably.
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Returns the top-level container with the given tag.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::MissingContainer` if the root has no such child.
    pub fn container(&self, name: &str) -> TreeResult<&Node> {
        self.root
            .child(name)
            .ok_or_else(|| TreeError::missing_container(name))
    }

    /// Returns the top-level container with the given tag, mutably.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::MissingContainer` if the root has no such child.
    pub fn container_mut(&mut self, name: &str) -> TreeResult<&mut Node> {
        self.root
            .child_mut(name)
            .ok_or_else(|| TreeError::missing_container(name))
    }

    /// Maps a certificate authority display name to its `refid`.
    ///
    /// Returns the first `<ca>` whose `descr` equals `descr`.
    #[must_use]
    pub fn resolve_ca_ref(&self, descr: &str) -> Option<String> {
        let found = self
            .root
            .children_named(CA_TAG)
            .map(|(_, ca)| ca)
            .find(|ca| ca.child_text("descr") == Some(descr))
            .and_then(|ca| ca.child_text("refid"))
            .map(str::to_string);
        debug!(ca = descr, refid = ?found, "resolved certificate authority");
        found
    }

    /// Rewrites the revision stamp.
    ///
    /// The `<revision>` element is created after the last top-level child
    /// if missing.
    pub fn stamp_revision(&mut self, description: &str, username: &str, time: u64) {
        let fields = [
            ("time", time.to_string()),
            ("description", description.to_string()),
            ("username", username.to_string()),
        ];
        match self.root.child_mut(REVISION_TAG) {
            Some(revision) => {
                revision.merge_fields(fields);
            }
            None => {
                let mut revision = Node::new(REVISION_TAG);
                revision.merge_fields(fields);
                self.root.push_child(revision);
            }
        }
    }
}
