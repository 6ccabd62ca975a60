//! Load status bookkeeping for assets that arrive asynchronously.

use std::{collections::BTreeMap, fmt::Debug};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Loaded,
    Failed(String),
}

impl AssetStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, AssetStatus::Pending)
    }
}

/// Tracks every registered asset from `Pending` to either `Loaded` or `Failed`.
///
/// A status settles exactly once. Later resolutions of the same key are
/// ignored with a warning.
#[derive(Clone, Debug)]
pub struct AssetTracker<K: Ord> {
    statuses: BTreeMap<K, AssetStatus>,
}

impl<K: Ord> Default for AssetTracker<K> {
    fn default() -> Self {
        Self {
            statuses: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy + Debug> AssetTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as pending. Registering a key twice keeps its current status.
    pub fn register(&mut self, key: K) {
        self.statuses.entry(key).or_insert(AssetStatus::Pending);
    }

    /// Settle a pending asset. Returns `false` if `key` was unknown or already settled.
    pub fn resolve<T, E: ToString>(&mut self, key: K, result: &Result<T, E>) -> bool {
        match self.statuses.get_mut(&key) {
            None => {
                log::warn!("Asset {key:?} was resolved without being registered.");
                false
            }
            Some(status) if status.is_settled() => {
                log::warn!("Asset {key:?} was already settled as {status:?}, ignoring.");
                false
            }
            Some(status) => {
                *status = match result {
                    Ok(_) => {
                        log::info!("Asset {key:?} loaded.");
                        AssetStatus::Loaded
                    }
                    Err(e) => {
                        let message = e.to_string();
                        log::warn!("Asset {key:?} failed to load: {message}");
                        AssetStatus::Failed(message)
                    }
                };
                true
            }
        }
    }

    pub fn status(&self, key: K) -> Option<&AssetStatus> {
        self.statuses.get(&key)
    }

    pub fn is_loaded(&self, key: K) -> bool {
        matches!(self.status(key), Some(AssetStatus::Loaded))
    }

    pub fn pending(&self) -> Vec<K> {
        self.statuses
            .iter()
            .filter(|(_, status)| !status.is_settled())
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn all_settled(&self) -> bool {
        self.statuses.values().all(AssetStatus::is_settled)
    }
}
