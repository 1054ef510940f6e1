use crate::visitor::collect_ids;
use crate::Node;
use crc32fast::Hasher;
use std::collections::HashSet;

/// Derive a short hex seed from a page id and a creation timestamp
pub fn get_session_seed(page_id: &str, timestamp_nanos: i64) -> String {
    let mut hasher = Hasher::new();
    hasher.update(page_id.as_bytes());
    hasher.update(b":");
    hasher.update(&timestamp_nanos.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential node id generator for one editing session.
///
/// Ids look like `{seed}-{count}`. The seed changes per session, so ids
/// from earlier sessions already stored in a page do not collide with new
/// ones; [`IdGenerator::fresh_id`] additionally checks against a tree.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    /// Seed from the page id and the current time
    pub fn new(page_id: &str) -> Self {
        let now = chrono::Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1000));
        Self::from_seed(get_session_seed(page_id, nanos))
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Next id not already used anywhere in `root`
    pub fn fresh_id(&mut self, root: &Node) -> String {
        let taken: HashSet<String> = collect_ids(root).into_iter().collect();
        self.fresh_id_avoiding(&taken)
    }

    /// Next id not present in `taken`
    pub fn fresh_id_avoiding(&mut self, taken: &HashSet<String>) -> String {
        loop {
            let id = self.new_id();
            if !taken.contains(&id) {
                return id;
            }
        }
    }

    /// Assign new ids to every node of `subtree`, avoiding `taken`.
    /// Newly assigned ids are added to `taken`.
    pub fn reassign_ids(&mut self, subtree: &mut Node, taken: &mut HashSet<String>) {
        let id = self.fresh_id_avoiding(taken);
        taken.insert(id.clone());
        subtree.id = id;
        for child in &mut subtree.children {
            self.reassign_ids(child, taken);
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
