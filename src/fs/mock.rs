// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Every successful `write`, in order.
    writes: Vec<PathBuf>,
    failing_reads: HashSet<PathBuf>,
}

/// In-memory filesystem for tests.
///
/// Directories are implicit: a path is a directory when some file lives
/// below it. Paths are compared exactly, so tests should use clean absolute
/// paths.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock();
        state
            .files
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Make every subsequent read of `path` fail with an I/O style error.
    pub fn fail_reads_of(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .failing_reads
            .insert(path.as_ref().to_path_buf());
    }

    /// Current content of `path` as UTF-8, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let state = self.state.lock();
        state
            .files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Paths passed to `write`, in call order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.state.lock().writes.clone()
    }

    /// Number of writes to `path`.
    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.state.lock().writes.iter().filter(|p| *p == path).count()
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.state.lock();
        if state.failing_reads.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.files.get(path) {
            Some(content) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            None if is_dir_locked(&state, path) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        state.files.insert(path.to_path_buf(), contents.to_vec());
        state.writes.push(path.to_path_buf());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock();
        match state.files.remove(path) {
            Some(_) => Ok(()),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || is_dir_locked(&state, path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state.lock().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        is_dir_locked(&self.state.lock(), path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock();
        if !is_dir_locked(&state, path) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }

        let mut children = BTreeSet::new();
        for file in state.files.keys() {
            if let Ok(rel) = file.strip_prefix(path) {
                if let Some(first) = rel.components().next() {
                    children.insert(path.join(first.as_os_str()));
                }
            }
        }
        Ok(children.into_iter().collect())
    }
}

fn is_dir_locked(state: &MockState, path: &Path) -> bool {
    state
        .files
        .keys()
        .any(|file| file != path && file.starts_with(path))
}
