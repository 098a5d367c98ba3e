//! File-based configuration store for `config.xml`.

use crate::error::{TreeError, TreeResult};
use crate::store::{unix_now_micros, ConfigStore, DEFAULT_USERNAME};
use crate::tree::ConfigTree;
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A configuration store backed by an XML file.
///
/// # Locking
///
/// Opening a `FileStore` takes an exclusive advisory lock on a sibling
/// `<file>.lock`. The lock is held until the store is dropped, so a
/// load-mutate-persist cycle is serialised against other processes.
///
/// # Durability
///
/// `persist` writes the new document to `<file>.tmp`, syncs it and renames
/// it over the original, then syncs the directory. When a backup directory
/// is configured, the previous document is copied there first as
/// `config-<unix seconds>-<microseconds>.xml`, with a counter appended if
/// that name is already taken.
///
/// # Example
///
/// ```no_run
/// use pfconf_tree::{ConfigStore, FileStore};
/// use std::path::Path;
///
/// let mut store = FileStore::open(Path::new("/conf/config.xml")).unwrap();
/// let tree = store.load().unwrap();
/// store.persist(tree, "rewrite").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    backup_dir: Option<PathBuf>,
    username: String,
    _lock_file: File,
}

impl FileStore {
    /// Opens the store for `path` and acquires the configuration lock.
    ///
    /// The document itself is not read until [`ConfigStore::load`].
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Locked` if another process holds the lock, or
    /// an I/O error if the lock file cannot be created.
    pub fn open(path: &Path) -> TreeResult<Self> {
        let lock_path = sibling(path, ".lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        lock_file.try_lock_exclusive().map_err(lock_error)?;
        debug!(path = %path.display(), "acquired configuration lock");

        Ok(Self {
            path: path.to_path_buf(),
            backup_dir: None,
            username: DEFAULT_USERNAME.to_string(),
            _lock_file: lock_file,
        })
    }

    /// Keeps a copy of the previous document in `dir` on every persist.
    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Sets the username recorded in revision stamps.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Returns the path of the configuration document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_previous(&self, dir: &Path, micros: u64) -> TreeResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(dir)?;
        let target = backup_path(dir, micros);
        fs::copy(&self.path, &target)?;
        debug!(backup = %target.display(), "backed up previous configuration");
        Ok(())
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> TreeResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            File::open(parent)?.sync_all()?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> TreeResult<()> {
        Ok(())
    }
}

impl ConfigStore for FileStore {
    fn load(&self) -> TreeResult<ConfigTree> {
        let xml = fs::read_to_string(&self.path)?;
        ConfigTree::parse(&xml)
    }

    fn persist(&mut self, mut tree: ConfigTree, description: &str) -> TreeResult<()> {
        let micros = unix_now_micros();
        tree.stamp_revision(description, &self.username, micros / 1_000_000);
        let xml = tree.to_xml()?;

        if let Some(dir) = &self.backup_dir {
            self.backup_previous(dir, micros)?;
        }

        let temp_path = sibling(&self.path, ".tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(xml.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        self.sync_directory()?;

        info!(path = %self.path.display(), description, "persisted configuration");
        Ok(())
    }
}

/// Maps a failed lock attempt: contention is `Locked`, anything else is I/O.
fn lock_error(err: io::Error) -> TreeError {
    if err.kind() == fs2::lock_contended_error().kind() {
        TreeError::Locked
    } else {
        TreeError::Io(err)
    }
}

fn backup_path(dir: &Path, micros: u64) -> PathBuf {
    let stem = format!(
        "config-{}-{:06}",
        micros / 1_000_000,
        micros % 1_000_000
    );
    let mut target = dir.join(format!("{stem}.xml"));
    let mut counter = 1;
    while target.exists() {
        target = dir.join(format!("{stem}-{counter}.xml"));
        counter += 1;
    }
    target
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
