//! Element node of the configuration tree.

use std::collections::BTreeMap;

/// Field-name to value mapping of a node, used for diffing.
///
/// Leaf children map to their text (empty when the element has none).
/// Children that have their own children are flattened with a dotted
/// path, e.g. `revision.time`. Repeated tags keep the first value, the
/// same child that [`Node::child_text`] and [`Node::merge_fields`] act on.
pub type Snapshot = BTreeMap<String, String>;

/// An element of the configuration tree.
///
/// A node is either a leaf carrying optional text, or a container of
/// ordered child elements. Child order is preserved exactly as loaded,
/// since the configuration format groups related entries positionally.
/// Attributes are carried through load and save but take no part in
/// snapshots or merges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    /// Creates an empty, detached node with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Creates a leaf node carrying `text`.
    #[must_use]
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// Returns the element tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the element attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Appends an attribute.
    pub fn push_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    /// Returns the element text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replaces the element text.
    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Returns all children in document order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns `true` if the node has no child elements.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Appends a child at the end.
    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Returns the first child with the given tag.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Returns the first child with the given tag, mutably.
    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// Returns the child at `index`, if any.
    #[must_use]
    pub fn child_at(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Returns the child at `index` mutably, if any.
    pub fn child_at_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index)
    }

    /// Returns the text of the first child with the given tag.
    #[must_use]
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).and_then(Node::text)
    }

    /// Iterates over children with the given tag, together with their
    /// index in the full child list.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (usize, &'a Node)> {
        self.children
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.tag == tag)
    }

    /// Inserts `child` at `index`, shifting later children.
    ///
    /// Indices past the end are clamped, so the child is appended.
    /// Returns the index the child ended up at.
    pub fn insert_child(&mut self, index: usize, child: Node) -> usize {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        index
    }

    /// Detaches and returns the child at `index`.
    pub fn remove_child(&mut self, index: usize) -> Option<Node> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// Detaches and returns the first child with the given tag.
    pub fn remove_named(&mut self, tag: &str) -> Option<Node> {
        let index = self.children.iter().position(|c| c.tag == tag)?;
        Some(self.children.remove(index))
    }

    /// Produces a field mapping of this node's children.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut out = Snapshot::new();
        for child in &self.children {
            child.flatten_into("", &mut out);
        }
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Snapshot) {
        let key = if prefix.is_empty() {
            self.tag.clone()
        } else {
            format!("{prefix}.{}", self.tag)
        };
        if self.children.is_empty() {
            out.entry(key)
                .or_insert_with(|| self.text.clone().unwrap_or_default());
        } else {
            for child in &self.children {
                child.flatten_into(&key, out);
            }
        }
    }

    /// Sparse-merges leaf `fields` into this node.
    ///
    /// Existing children are overwritten only when their text differs;
    /// missing children are appended in the order given. Children not
    /// named in `fields` are left untouched. A missing text compares
    /// equal to the empty string.
    ///
    /// Returns `true` if any value changed.
    pub fn merge_fields<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut changed = false;
        for (key, value) in fields {
            let (key, value) = (key.as_ref(), value.as_ref());
            match self.child_mut(key) {
                Some(existing) => {
                    if existing.text().unwrap_or("") != value {
                        existing.text = Some(value.to_string());
                        changed = true;
                    }
                }
                None => {
                    self.children.push(Node::with_text(key, value));
                    changed = true;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut system = Node::new("system");
        system.push_child(Node::with_text("hostname", "fw"));
        system.push_child(Node::with_text("authserver", "a"));
        system.push_child(Node::with_text("domain", "example.com"));
        system.push_child(Node::with_text("authserver", "b"));
        system
    }

    #[test]
    fn children_named_reports_full_list_indices() {
        let system = sample();
        let found: Vec<usize> = system.children_named("authserver").map(|(i, _)| i).collect();
        assert_eq!(found, vec![1, 3]);
    }

    #[test]
    fn insert_child_shifts_later_children() {
        let mut system = sample();
        let at = system.insert_child(2, Node::new("new"));
        assert_eq!(at, 2);
        assert_eq!(system.children()[2].tag(), "new");
        assert_eq!(system.children()[3].tag(), "domain");
    }

    #[test]
    fn insert_child_past_end_appends() {
        let mut system = Node::new("system");
        let at = system.insert_child(1, Node::new("authserver"));
        assert_eq!(at, 0);
        assert_eq!(system.children().len(), 1);
    }

    #[test]
    fn remove_child_out_of_range_is_none() {
        let mut system = sample();
        assert!(system.remove_child(10).is_none());
        let removed = system.remove_child(1).unwrap();
        assert_eq!(removed.text(), Some("a"));
        assert_eq!(system.children().len(), 3);
    }

    #[test]
    fn snapshot_flattens_nested_children() {
        let mut root = Node::new("pfsense");
        root.push_child(Node::with_text("version", "21.7"));
        let mut revision = Node::new("revision");
        revision.push_child(Node::with_text("time", "100"));
        root.push_child(revision);
        root.push_child(Node::new("empty"));

        let snap = root.snapshot();
        assert_eq!(snap.get("version").map(String::as_str), Some("21.7"));
        assert_eq!(snap.get("revision.time").map(String::as_str), Some("100"));
        assert_eq!(snap.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn merge_fields_is_sparse() {
        let mut entry = Node::new("authserver");
        entry.push_child(Node::with_text("host", "old"));
        entry.push_child(Node::with_text("ldap_bindpw", "secret"));

        let changed = entry.merge_fields([("host", "new")]);
        assert!(changed);
        assert_eq!(entry.child_text("host"), Some("new"));
        assert_eq!(entry.child_text("ldap_bindpw"), Some("secret"));
    }

    #[test]
    fn merge_fields_reports_no_change_for_equal_values() {
        let mut entry = Node::new("authserver");
        entry.push_child(Node::with_text("host", "same"));
        entry.push_child(Node::new("ldap_extended_enabled"));

        assert!(!entry.merge_fields([("host", "same"), ("ldap_extended_enabled", "")]));
    }

    #[test]
    fn merge_fields_appends_missing_children_in_order() {
        let mut entry = Node::new("authserver");
        assert!(entry.merge_fields([("name", "AD"), ("type", "ldap")]));
        let tags: Vec<&str> = entry.children().iter().map(Node::tag).collect();
        assert_eq!(tags, vec!["name", "type"]);
    }

    #[test]
    fn snapshot_and_lookup_agree_on_repeated_tags() {
        let mut entry = Node::new("authserver");
        entry.push_child(Node::with_text("host", "first"));
        entry.push_child(Node::with_text("host", "second"));

        assert_eq!(entry.child_text("host"), Some("first"));
        assert_eq!(entry.snapshot().get("host").map(String::as_str), Some("first"));

        entry.merge_fields([("host", "merged")]);
        assert_eq!(entry.snapshot().get("host").map(String::as_str), Some("merged"));
        assert_eq!(entry.children()[1].text(), Some("second"));
    }

    #[test]
    fn remove_named_takes_first_match() {
        let mut entry = Node::new("authserver");
        entry.push_child(Node::with_text("ldap_caref", "5f3c"));
        entry.push_child(Node::with_text("host", "ad"));

        let removed = entry.remove_named("ldap_caref").unwrap();
        assert_eq!(removed.text(), Some("5f3c"));
        assert!(entry.remove_named("ldap_caref").is_none());
        assert_eq!(entry.children().len(), 1);
    }
}
