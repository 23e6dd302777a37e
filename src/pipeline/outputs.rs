// src/pipeline/outputs.rs

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::fs::PathKey;

#[derive(Debug, Default)]
struct Inner {
    source_of: HashMap<PathKey, PathBuf>,
    outputs_of: HashMap<PathKey, BTreeMap<PathKey, PathBuf>>,
}

/// Which source produced which derived file, for the outputs written in
/// this process.
#[derive(Debug, Default)]
pub struct OutputIndex {
    inner: RwLock<Inner>,
}

impl OutputIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, source: &Path, output: &Path) {
        let mut inner = self.inner.write();
        let output_key = PathKey::new(output);
        if let Some(previous) = inner.source_of.insert(output_key.clone(), source.to_path_buf()) {
            let previous_key = PathKey::new(&previous);
            if let Some(outputs) = inner.outputs_of.get_mut(&previous_key) {
                outputs.remove(&output_key);
            }
        }
        inner
            .outputs_of
            .entry(PathKey::new(source))
            .or_default()
            .insert(output_key, output.to_path_buf());
    }

    pub fn source_of(&self, output: &Path) -> Option<PathBuf> {
        self.inner.read().source_of.get(&PathKey::new(output)).cloned()
    }

    pub fn outputs_of(&self, source: &Path) -> Vec<PathBuf> {
        self.inner
            .read()
            .outputs_of
            .get(&PathKey::new(source))
            .map(|o| o.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop everything recorded for `source` and return its outputs.
    pub fn forget_source(&self, source: &Path) -> Vec<PathBuf> {
        let mut inner = self.inner.write();
        let Some(outputs) = inner.outputs_of.remove(&PathKey::new(source)) else {
            return Vec::new();
        };
        for key in outputs.keys() {
            inner.source_of.remove(key);
        }
        outputs.into_values().collect()
    }
}
