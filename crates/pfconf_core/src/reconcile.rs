//! Reconciliation of desired state against the configuration tree.
//!
//! The reconciler takes one desired state, finds the matching entry and
//! applies the smallest mutation that makes the tree agree with it:
//!
//! | Desired   | Entry found | Mutation                             |
//! |-----------|-------------|--------------------------------------|
//! | present   | no          | insert after the last sibling        |
//! | present   | yes         | sparse field merge                   |
//! | absent    | yes         | remove                               |
//! | absent    | no          | none                                 |
//!
//! Every call returns a [`Reconciliation`] with before/after snapshots.
//! In dry-run mode the same work is done against a private clone, so
//! the diff is exactly what a real run would produce.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::resolver::{locate, Located};
use crate::server::{LdapServer, CA_REF_FIELD};
use crate::types::Identity;
use pfconf_tree::{ConfigTree, IdGenerator, Node, Snapshot, TreeError, UniqidGenerator};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Before and after snapshots of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diff {
    /// Entry fields before the call; empty if the entry did not exist.
    pub before: Snapshot,
    /// Entry fields after the call; empty if the entry was removed or
    /// never existed.
    pub after: Snapshot,
}

/// Result of a reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Whether the tree was (or in dry-run, would have been) mutated.
    pub changed: bool,
    /// Field snapshots around the call.
    pub diff: Diff,
    /// Human-readable change description to persist with.
    #[serde(skip)]
    pub description: String,
    /// Index of the entry in its container after the call.
    #[serde(skip)]
    pub index: Option<usize>,
}

impl Reconciliation {
    fn unchanged(description: String) -> Self {
        Self {
            changed: false,
            diff: Diff::default(),
            description,
            index: None,
        }
    }
}

/// Applies desired states to a configuration tree.
pub struct Reconciler {
    config: Config,
    ids: Box<dyn IdGenerator>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler that assigns time-based `refid`s.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ids: Box::new(UniqidGenerator::new()),
        }
    }

    /// Replaces the identifier source for new entries.
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Makes the tree contain an entry matching `desired`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the certificate authority cannot
    /// be resolved and the transport is encrypted. The tree is not touched
    /// in that case. Store errors (missing container, id generation) are
    /// propagated.
    pub fn ensure_present(
        &self,
        tree: &mut ConfigTree,
        desired: &LdapServer,
    ) -> CoreResult<Reconciliation> {
        if self.config.dry_run {
            let mut scratch = tree.clone();
            return self.present_in(&mut scratch, desired);
        }
        self.present_in(tree, desired)
    }

    /// Makes the tree contain no entry with `identity`.
    ///
    /// # Errors
    ///
    /// Returns store errors such as a missing container.
    pub fn ensure_absent(
        &self,
        tree: &mut ConfigTree,
        identity: &Identity,
    ) -> CoreResult<Reconciliation> {
        if self.config.dry_run {
            let mut scratch = tree.clone();
            return self.absent_in(&mut scratch, identity);
        }
        self.absent_in(tree, identity)
    }

    fn present_in(&self, tree: &mut ConfigTree, desired: &LdapServer) -> CoreResult<Reconciliation> {
        let ca_ref = tree.resolve_ca_ref(&desired.ca);
        if ca_ref.is_none() && desired.transport.is_encrypted() {
            return Err(CoreError::ca_not_found(&desired.ca));
        }

        let identity = desired.identity();
        let fields = desired.fields(ca_ref.as_deref());
        let container = tree.container_mut(&self.config.container)?;
        let located = locate(container, &self.config.entry_tag, &identity);
        self.report_duplicates(&identity, &located);

        let Some(index) = located.matched else {
            let refid = self.ids.next_id()?;
            let mut entry = Node::new(self.config.entry_tag.as_str());
            entry.merge_fields(fields);
            entry.merge_fields([("refid", refid.as_str())]);
            let after = entry.snapshot();
            let index = container.insert_child(located.insertion_index(), entry);

            info!(%identity, index, refid = %refid, "added entry");
            return Ok(Reconciliation {
                changed: true,
                diff: Diff {
                    before: Snapshot::new(),
                    after,
                },
                description: self.describe("added", &identity),
                index: Some(index),
            });
        };

        let entry = container
            .child_at_mut(index)
            .ok_or_else(|| TreeError::malformed(format!("entry {identity} vanished at {index}")))?;
        let before = entry.snapshot();
        let mut changed = entry.merge_fields(fields);
        if ca_ref.is_none() && entry.remove_named(CA_REF_FIELD).is_some() {
            debug!(%identity, "cleared certificate authority reference");
            changed = true;
        }
        let after = entry.snapshot();

        if changed {
            info!(%identity, index, "updated entry");
        } else {
            debug!(%identity, index, "entry already up to date");
        }
        Ok(Reconciliation {
            changed,
            diff: Diff { before, after },
            description: self.describe("updated", &identity),
            index: Some(index),
        })
    }

    fn absent_in(&self, tree: &mut ConfigTree, identity: &Identity) -> CoreResult<Reconciliation> {
        let container = tree.container_mut(&self.config.container)?;
        let located = locate(container, &self.config.entry_tag, identity);
        self.report_duplicates(identity, &located);

        let description = self.describe("removed", identity);
        let Some(removed) = located.matched.and_then(|i| container.remove_child(i)) else {
            debug!(%identity, "entry already absent");
            return Ok(Reconciliation::unchanged(description));
        };

        info!(%identity, "removed entry");
        Ok(Reconciliation {
            changed: true,
            diff: Diff {
                before: removed.snapshot(),
                after: Snapshot::new(),
            },
            description,
            index: None,
        })
    }

    fn report_duplicates(&self, identity: &Identity, located: &Located) {
        if located.duplicates > 0 {
            warn!(
                %identity,
                duplicates = located.duplicates,
                "multiple entries share this identity; using the first"
            );
        }
    }

    fn describe(&self, action: &str, identity: &Identity) -> String {
        format!(
            "{} {}_{} {} \"{}\"",
            self.config.description_prefix,
            self.config.entry_tag,
            identity.kind,
            action,
            identity.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchScope, Transport};
    use pfconf_tree::SequentialIds;

    const DOC: &str = r#"<pfsense>
  <system>
    <hostname>fw</hostname>
    <authserver><name>radius</name><type>radius</type><refid>r1</refid></authserver>
    <domain>example.com</domain>
  </system>
  <ca><refid>5f3c</refid><descr>InternalCA</descr></ca>
</pfsense>"#;

    fn tree() -> ConfigTree {
        ConfigTree::parse(DOC).unwrap()
    }

    fn reconciler(config: Config) -> Reconciler {
        Reconciler::new(config).with_id_generator(SequentialIds::new("id"))
    }

    fn ad() -> LdapServer {
        LdapServer::new("AD", "ad.example.com", Transport::Ssl, SearchScope::Subtree, "cn=users")
            .port(636)
            .ca("InternalCA")
    }

    fn tags(tree: &ConfigTree) -> Vec<String> {
        tree.container("system")
            .unwrap()
            .children()
            .iter()
            .map(|c| c.tag().to_string())
            .collect()
    }

    #[test]
    fn present_inserts_after_last_sibling() {
        let mut tree = tree();
        let result = reconciler(Config::default()).ensure_present(&mut tree, &ad()).unwrap();

        assert!(result.changed);
        assert!(result.diff.before.is_empty());
        assert_eq!(result.index, Some(2));
        assert_eq!(tags(&tree), vec!["hostname", "authserver", "authserver", "domain"]);
        assert_eq!(result.diff.after.get("ldap_caref").map(String::as_str), Some("5f3c"));
        assert_eq!(result.diff.after.get("refid").map(String::as_str), Some("id1"));
        assert_eq!(result.description, "pfconf authserver_ldap added \"AD\"");
    }

    #[test]
    fn present_twice_is_idempotent() {
        let mut tree = tree();
        let reconciler = reconciler(Config::default());
        assert!(reconciler.ensure_present(&mut tree, &ad()).unwrap().changed);
        let snapshot = tree.clone();

        let second = reconciler.ensure_present(&mut tree, &ad()).unwrap();
        assert!(!second.changed);
        assert_eq!(second.diff.before, second.diff.after);
        assert_eq!(tree, snapshot);
    }

    #[test]
    fn unresolved_ca_with_encryption_fails_without_mutation() {
        let mut tree = tree();
        let before = tree.clone();
        let err = reconciler(Config::default())
            .ensure_present(&mut tree, &ad().ca("Missing"))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(tree, before);
    }

    #[test]
    fn unresolved_ca_tolerated_for_tcp() {
        let mut tree = tree();
        let mut desired = ad().ca("Missing");
        desired.transport = Transport::Tcp;
        let result = reconciler(Config::default()).ensure_present(&mut tree, &desired).unwrap();
        assert!(result.changed);
        assert!(!result.diff.after.contains_key("ldap_caref"));
    }

    #[test]
    fn dry_run_leaves_tree_untouched() {
        let mut tree = tree();
        let before = tree.clone();
        let result = reconciler(Config::new().dry_run(true))
            .ensure_present(&mut tree, &ad())
            .unwrap();
        assert!(result.changed);
        assert_eq!(tree, before);
    }

    #[test]
    fn absent_removes_only_the_match() {
        let mut tree = tree();
        let reconciler = reconciler(Config::default());
        reconciler.ensure_present(&mut tree, &ad()).unwrap();

        let result = reconciler.ensure_absent(&mut tree, &Identity::ldap("AD")).unwrap();
        assert!(result.changed);
        assert_eq!(result.diff.before.get("name").map(String::as_str), Some("AD"));
        assert!(result.diff.after.is_empty());
        assert_eq!(tags(&tree), vec!["hostname", "authserver", "domain"]);
        assert_eq!(result.description, "pfconf authserver_ldap removed \"AD\"");
    }

    #[test]
    fn absent_on_missing_entry_is_noop() {
        let mut tree = tree();
        let result = reconciler(Config::default())
            .ensure_absent(&mut tree, &Identity::ldap("AD"))
            .unwrap();
        assert!(!result.changed);
        assert_eq!(result.diff, Diff::default());
    }

    #[test]
    fn missing_container_is_store_error() {
        let mut tree = ConfigTree::parse("<pfsense/>").unwrap();
        let mut desired = ad();
        desired.transport = Transport::Tcp;
        let err = reconciler(Config::default())
            .ensure_present(&mut tree, &desired)
            .unwrap_err();
        assert!(matches!(err, CoreError::Store(TreeError::MissingContainer { .. })));
    }

    #[test]
    fn switching_to_tcp_without_ca_clears_reference() {
        let mut tree = tree();
        let reconciler = reconciler(Config::default());
        reconciler.ensure_present(&mut tree, &ad()).unwrap();

        let mut plain = ad().ca("global");
        plain.transport = Transport::Tcp;
        let result = reconciler.ensure_present(&mut tree, &plain).unwrap();

        assert!(result.changed);
        assert_eq!(result.diff.before.get("ldap_caref").map(String::as_str), Some("5f3c"));
        assert!(!result.diff.after.contains_key("ldap_caref"));
        assert_eq!(
            result.diff.after.get("ldap_urltype").map(String::as_str),
            Some("TCP - Standard")
        );
        assert!(!reconciler.ensure_present(&mut tree, &plain).unwrap().changed);
    }
}
