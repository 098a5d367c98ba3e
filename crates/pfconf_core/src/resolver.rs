//! Identity resolution among sibling entries.

use crate::types::Identity;
use pfconf_tree::Node;

/// Outcome of scanning a container for an identity.
///
/// All indices refer to the container's full child list, not to the
/// filtered list of entries, because insertion happens relative to the
/// full list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    /// Index of the first entry with the identity.
    pub matched: Option<usize>,
    /// Index of the match, or of the last scanned entry when there is no
    /// match. `0` when the container has no entries of this tag.
    pub anchor: usize,
    /// Number of further entries sharing the identity.
    pub duplicates: usize,
}

impl Located {
    /// Returns the index a new entry should be inserted at.
    #[must_use]
    pub const fn insertion_index(&self) -> usize {
        self.anchor + 1
    }
}

/// Finds the entry with `identity` among the `tag` children of `container`.
///
/// An entry matches when its `name` and `type` children equal the
/// identity's name and kind; entries missing either never match. The
/// first match wins. Never fails: absence is a normal outcome.
#[must_use]
pub fn locate(container: &Node, tag: &str, identity: &Identity) -> Located {
    let mut located = Located {
        matched: None,
        anchor: 0,
        duplicates: 0,
    };

    for (index, entry) in container.children_named(tag) {
        let is_match = entry.child_text("name") == Some(identity.name.as_str())
            && entry.child_text("type") == Some(identity.kind.as_str());

        if located.matched.is_some() {
            if is_match {
                located.duplicates += 1;
            }
            continue;
        }

        located.anchor = index;
        if is_match {
            located.matched = Some(index);
        }
    }

    located
}
