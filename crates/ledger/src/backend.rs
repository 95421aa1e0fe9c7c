// Durable storage for the serialized ledger
//
// The store only ever reads or replaces the whole blob, and does so inside
// a `WriteLock` when other processes may share the same storage.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fs4::FileExt;

/// Exclusive access to a backend for one read-modify-write cycle. Dropping it
/// releases the lock.
#[derive(Debug, Default)]
pub struct WriteLock {
    _file: Option<File>,
}

pub trait LedgerBackend: Send + Sync {
    /// Block until no other writer holds the storage. Backends that cannot
    /// be shared across processes need not lock anything.
    fn lock(&self) -> io::Result<WriteLock> {
        Ok(WriteLock::default())
    }

    /// Current persisted bytes, or `None` if nothing has been written yet.
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the persisted bytes. Must not leave a half-written state.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

impl<B: LedgerBackend + ?Sized> LedgerBackend for Arc<B> {
    fn lock(&self) -> io::Result<WriteLock> {
        (**self).lock()
    }

    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A JSON file on disk. Writes go to `<file>.tmp` and are renamed over the
/// target, so readers see either the old or the new ledger. Writers
/// serialize on an advisory lock held on `<file>.lock`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

impl LedgerBackend for FileBackend {
    fn lock(&self) -> io::Result<WriteLock> {
        create_parent(&self.path)?;
        // The ledger itself is replaced by rename, so the lock lives on a
        // file that is never swapped out.
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.sibling(".lock"))?;
        FileExt::lock_exclusive(&file)?;
        Ok(WriteLock { _file: Some(file) })
    }

    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        create_parent(&self.path)?;
        let tmp_path = self.sibling(".tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local storage. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing persisted bytes.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
        }
    }

    /// Snapshot of what has been written so far.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl LedgerBackend for MemoryBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        *self.bytes.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
