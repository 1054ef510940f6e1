//! Lifecycle of injected stylesheet fragments.
//!
//! The registry mirrors the `<style>` elements a host document currently
//! holds, one per node id. Every change is reported as a [`FragmentPatch`]
//! so the host (canvas, hot-reload client) can apply the same edits.
//!
//! Invariants:
//! - at most one fragment per node id (insert replaces)
//! - after `sync`, only nodes present in the latest render own a fragment
//! - `clear` releases every fragment

use crate::css::StyleFragment;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A fragment operation for the host document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FragmentPatch {
    /// Inject a new `<style>` element
    Insert { fragment: StyleFragment },

    /// Swap the text of an existing element
    Replace { fragment: StyleFragment },

    /// Remove the element with this id
    Remove {
        #[serde(rename = "nodeId")]
        node_id: String,
        #[serde(rename = "elementId")]
        element_id: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    fragments: BTreeMap<String, StyleFragment>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, node_id: &str) -> Option<&StyleFragment> {
        self.fragments.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.fragments.contains_key(node_id)
    }

    /// Idempotent insert-or-replace. Returns `None` when the stored fragment
    /// is already identical.
    pub fn upsert(&mut self, fragment: StyleFragment) -> Option<FragmentPatch> {
        match self.fragments.get(&fragment.node_id) {
            Some(existing) if *existing == fragment => None,
            Some(_) => {
                self.fragments.insert(fragment.node_id.clone(), fragment.clone());
                Some(FragmentPatch::Replace { fragment })
            }
            None => {
                self.fragments.insert(fragment.node_id.clone(), fragment.clone());
                Some(FragmentPatch::Insert { fragment })
            }
        }
    }

    /// Release the fragment of an unmounted node
    pub fn remove(&mut self, node_id: &str) -> Option<FragmentPatch> {
        self.fragments.remove(node_id).map(|fragment| FragmentPatch::Remove {
            node_id: fragment.node_id,
            element_id: fragment.element_id,
        })
    }

    /// Bring the registry in line with a fresh render.
    ///
    /// Fragments missing from `current` (deleted nodes, or nodes whose last
    /// override was cleared) are removed first, then the rest are upserted.
    pub fn sync(&mut self, current: &[StyleFragment]) -> Vec<FragmentPatch> {
        let live: HashSet<&str> = current.iter().map(|f| f.node_id.as_str()).collect();
        let stale: Vec<String> = self
            .fragments
            .keys()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();

        let mut patches: Vec<FragmentPatch> = stale.iter().filter_map(|id| self.remove(id)).collect();
        patches.extend(current.iter().cloned().filter_map(|f| self.upsert(f)));

        if !patches.is_empty() {
            debug!(patches = patches.len(), fragments = self.len(), "Synced style fragments");
        }
        patches
    }

    /// Remove everything, e.g. when the editor canvas unmounts
    pub fn clear(&mut self) -> Vec<FragmentPatch> {
        let ids: Vec<String> = self.fragments.keys().cloned().collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &StyleFragment> {
        self.fragments.values()
    }

    /// Combined CSS of all registered fragments, ordered by node id
    pub fn to_css(&self) -> String {
        self.fragments
            .values()
            .map(|f| f.css.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Replay patches onto a plain id → css map, the way a host document would
pub fn apply_fragment_patches(elements: &mut BTreeMap<String, String>, patches: &[FragmentPatch]) {
    for patch in patches {
        match patch {
            FragmentPatch::Insert { fragment } | FragmentPatch::Replace { fragment } => {
                elements.insert(fragment.element_id.clone(), fragment.css.clone());
            }
            FragmentPatch::Remove { element_id, .. } => {
                elements.remove(element_id);
            }
        }
    }
}
