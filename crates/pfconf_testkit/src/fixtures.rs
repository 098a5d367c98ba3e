//! Test fixtures and store helpers.
//!
//! Provides sample configuration documents and stores preloaded with
//! them, in memory or in a temporary directory.

use pfconf_tree::{ConfigTree, FileStore, InMemoryStore, Node};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Reference of the `InternalCA` certificate authority in [`BASE_CONFIG`].
pub const INTERNAL_CA_REF: &str = "5f3c";

/// A small but realistic configuration: a `system` container with one
/// RADIUS server between unrelated settings, and two certificate
/// authorities.
pub const BASE_CONFIG: &str = r#"<?xml version="1.0"?>
<pfsense>
	<version>21.7</version>
	<system>
		<optimization>normal</optimization>
		<hostname>fw</hostname>
		<domain>example.com</domain>
		<group>
			<name>admins</name>
			<gid>1999</gid>
		</group>
		<authserver>
			<refid>5c00e1f2a1b3d</refid>
			<type>radius</type>
			<name>RADIUS</name>
			<host>radius.example.com</host>
		</authserver>
		<webgui>
			<protocol>https</protocol>
		</webgui>
	</system>
	<ca>
		<refid>5f3c</refid>
		<descr>InternalCA</descr>
	</ca>
	<ca>
		<refid>7a1e</refid>
		<descr>PartnerCA</descr>
	</ca>
</pfsense>
"#;

/// A configuration whose `system` container has no authentication servers.
pub const EMPTY_SYSTEM_CONFIG: &str = r#"<?xml version="1.0"?>
<pfsense>
	<system>
		<hostname>fw</hostname>
		<domain>example.com</domain>
	</system>
	<ca>
		<refid>5f3c</refid>
		<descr>InternalCA</descr>
	</ca>
</pfsense>
"#;

/// Parses [`BASE_CONFIG`].
pub fn base_tree() -> ConfigTree {
    ConfigTree::parse(BASE_CONFIG).expect("Fixture config must parse")
}

/// Returns an in-memory store holding [`BASE_CONFIG`].
pub fn memory_store() -> InMemoryStore {
    InMemoryStore::new(base_tree())
}

/// Number of `tag` children in `container` of `tree`.
pub fn count_entries(tree: &ConfigTree, container: &str, tag: &str) -> usize {
    tree.container(container)
        .map(|c| c.children_named(tag).count())
        .unwrap_or(0)
}

/// Tags of the children of `container`, in order.
pub fn child_tags(tree: &ConfigTree, container: &str) -> Vec<String> {
    tree.container(container)
        .map(|c| c.children().iter().map(|n| n.tag().to_string()).collect())
        .unwrap_or_default()
}

/// Returns the first `tag` child of `container` named `name`.
pub fn find_entry<'a>(tree: &'a ConfigTree, container: &str, tag: &'a str, name: &str) -> Option<&'a Node> {
    tree.container(container)
        .ok()?
        .children_named(tag)
        .map(|(_, n)| n)
        .find(|n| n.child_text("name") == Some(name))
}

/// A configuration file in a temporary directory.
pub struct TestConfigFile {
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestConfigFile {
    /// Writes `xml` to `config.xml` in a fresh temporary directory.
    pub fn with_contents(xml: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.xml");
        fs::write(&path, xml).expect("Failed to write config");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Writes [`BASE_CONFIG`].
    pub fn base() -> Self {
        Self::with_contents(BASE_CONFIG)
    }

    /// Returns the path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the temporary directory.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Opens a locked store on the file.
    pub fn store(&self) -> FileStore {
        FileStore::open(&self.path).expect("Failed to open file store")
    }

    /// Reads and parses the file as it is on disk now.
    pub fn read_tree(&self) -> ConfigTree {
        let xml = fs::read_to_string(&self.path).expect("Failed to read config");
        ConfigTree::parse(&xml).expect("Stored config must parse")
    }
}
