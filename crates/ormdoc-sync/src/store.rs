//! Where source text is read from and written back to.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait SourceStore {
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// The real filesystem. Files are read and written whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl SourceStore for FsStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        fs::write(path, text)
    }
}

/// In-memory files, for tests and dry tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<BTreeMap<PathBuf, String>>,
    writes: RefCell<Vec<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), text.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    /// Every path written so far, in write order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.borrow().clone()
    }
}

impl SourceStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not in the store", path.display()),
            )
        })
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), text.to_string());
        self.writes.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}
