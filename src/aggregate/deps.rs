// src/aggregate/deps.rs

//! Member file → config file index used to cascade rebuilds.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::fs::{PathKey, normalize};

type PathSet = BTreeMap<PathKey, PathBuf>;

#[derive(Debug, Default)]
struct Inner {
    /// member → configs declaring it
    by_member: HashMap<PathKey, PathSet>,
    /// config → members it declares
    by_config: HashMap<PathKey, PathSet>,
}

impl Inner {
    fn detach(&mut self, config: &PathKey) {
        let Some(members) = self.by_config.remove(config) else {
            return;
        };
        for member in members.keys() {
            if let Some(configs) = self.by_member.get_mut(member) {
                configs.remove(config);
                if configs.is_empty() {
                    self.by_member.remove(member);
                }
            }
        }
    }

    /// Would adding the edge `member → config` close a cycle?
    fn closes_cycle(&self, config: &PathKey, member: &PathKey) -> bool {
        if config == member {
            return true;
        }
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (m, configs) in self.by_member.iter() {
            for c in configs.keys() {
                graph.add_edge(m.as_str(), c.as_str(), ());
            }
        }
        graph.contains_node(config.as_str())
            && graph.contains_node(member.as_str())
            && has_path_connecting(&graph, config.as_str(), member.as_str(), None)
    }
}

/// Shared dependency index.
///
/// A config's associations are always replaced wholesale, never merged,
/// and a member no config references any more has no entry at all.
#[derive(Debug, Default)]
pub struct DependencyMap {
    inner: RwLock<Inner>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every association of `config` with `members`.
    ///
    /// Members that are the config itself, or that would make the config
    /// transitively depend on itself, are not recorded and are returned.
    pub fn replace_config(&self, config: &Path, members: &[PathBuf]) -> Vec<PathBuf> {
        let config_path = normalize(config);
        let config_key = PathKey::new(&config_path);

        let mut inner = self.inner.write();
        inner.detach(&config_key);

        let mut rejected = Vec::new();
        let mut accepted = PathSet::new();
        for member in members.iter() {
            let member_path = normalize(member);
            let member_key = PathKey::new(&member_path);
            if inner.closes_cycle(&config_key, &member_key) {
                rejected.push(member_path);
            } else {
                accepted.insert(member_key, member_path);
            }
        }

        for member_key in accepted.keys() {
            inner
                .by_member
                .entry(member_key.clone())
                .or_default()
                .insert(config_key.clone(), config_path.clone());
        }
        debug!(
            config = %config_path.display(),
            members = accepted.len(),
            rejected = rejected.len(),
            "config dependencies replaced"
        );
        if !accepted.is_empty() {
            inner.by_config.insert(config_key, accepted);
        }

        rejected
    }

    /// Drop every association of `config`. Returns whether it had any.
    pub fn remove_config(&self, config: &Path) -> bool {
        let key = PathKey::new(config);
        let mut inner = self.inner.write();
        let had = inner.by_config.contains_key(&key);
        inner.detach(&key);
        had
    }

    /// Configs that declare `member`, in a stable order.
    pub fn dependents_of(&self, member: &Path) -> Vec<PathBuf> {
        let inner = self.inner.read();
        inner
            .by_member
            .get(&PathKey::new(member))
            .map(|configs| configs.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_dependents(&self, member: &Path) -> bool {
        self.inner
            .read()
            .by_member
            .contains_key(&PathKey::new(member))
    }

    /// Members currently recorded for `config`.
    pub fn members_of(&self, config: &Path) -> Vec<PathBuf> {
        let inner = self.inner.read();
        inner
            .by_config
            .get(&PathKey::new(config))
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of member keys.
    pub fn len(&self) -> usize {
        self.inner.read().by_member.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_member.is_empty()
    }
}
