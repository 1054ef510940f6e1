//! # Tree Operations
//!
//! Pure functions over a page tree. Every structural operation takes the
//! current root by reference and returns a new root; the input is never
//! modified, so callers can keep old roots around for undo.
//!
//! Each operation comes in two forms:
//! - `try_*` returns a [`TreeError`] describing why nothing happened
//! - the plain form degrades any failure to "return the tree unchanged"
//!
//! Kind compatibility (e.g. a widget directly under the root) is *not*
//! checked here. Callers validate it before inserting or moving.
//!
//! ## Index semantics
//!
//! Indices beyond the child count append; negative indices clamp to 0.
//! For moves, the index is interpreted after the node has been detached
//! from its old position.

use crate::error::{TreeError, TreeResult};
use crate::id_generator::IdGenerator;
use crate::node::Node;
use crate::visitor::collect_ids;
use std::collections::HashSet;
use tracing::debug;

/// Depth-first search for the first node with `id`
pub fn find_node<'a>(root: &'a Node, id: &str) -> Option<&'a Node> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_node(child, id))
}

pub fn find_node_mut<'a>(root: &'a mut Node, id: &str) -> Option<&'a mut Node> {
    if root.id == id {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|child| find_node_mut(child, id))
}

/// Ancestor chain from the root down to the target, both inclusive
pub fn find_path<'a>(root: &'a Node, id: &str) -> Option<Vec<&'a Node>> {
    let mut path = Vec::new();
    if build_path(root, id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn build_path<'a>(node: &'a Node, id: &str, path: &mut Vec<&'a Node>) -> bool {
    path.push(node);
    if node.id == id {
        return true;
    }
    for child in &node.children {
        if build_path(child, id, path) {
            return true;
        }
    }
    path.pop();
    false
}

/// Direct parent of `id`; `None` for the root or a missing id
pub fn find_parent<'a>(root: &'a Node, id: &str) -> Option<&'a Node> {
    let path = find_path(root, id)?;
    if path.len() < 2 {
        return None;
    }
    Some(path[path.len() - 2])
}

pub fn contains_node(root: &Node, id: &str) -> bool {
    find_node(root, id).is_some()
}

/// Whether `id` lives in the subtree rooted at `ancestor_id` (inclusive)
pub fn is_in_subtree(root: &Node, ancestor_id: &str, id: &str) -> bool {
    find_node(root, ancestor_id).map_or(false, |ancestor| contains_node(ancestor, id))
}

fn clamp_index(index: Option<isize>, len: usize) -> usize {
    match index {
        None => len,
        Some(i) if i < 0 => 0,
        Some(i) => (i as usize).min(len),
    }
}

/// Detach `id` from its parent, returning it. Never detaches `node` itself.
fn detach(node: &mut Node, id: &str) -> Option<Node> {
    if let Some(pos) = node.children.iter().position(|c| c.id == id) {
        return Some(node.children.remove(pos));
    }

    for child in &mut node.children {
        if let Some(removed) = detach(child, id) {
            return Some(removed);
        }
    }

    None
}

/// Insert `new_node` under `parent_id` at `index` (default: append)
pub fn try_insert(
    root: &Node,
    parent_id: &str,
    new_node: Node,
    index: Option<isize>,
) -> TreeResult<Node> {
    let mut next = root.clone();
    let parent =
        find_node_mut(&mut next, parent_id).ok_or_else(|| TreeError::parent_not_found(parent_id))?;
    let at = clamp_index(index, parent.children.len());
    parent.children.insert(at, new_node);
    Ok(next)
}

pub fn insert(root: &Node, parent_id: &str, new_node: Node, index: Option<isize>) -> Node {
    unchanged_on_error("insert", root, try_insert(root, parent_id, new_node, index))
}

/// Remove `id` and its whole subtree
pub fn try_delete(root: &Node, id: &str) -> TreeResult<Node> {
    if root.id == id {
        return Err(TreeError::ProtectedRoot);
    }
    let mut next = root.clone();
    detach(&mut next, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    Ok(next)
}

pub fn delete_node(root: &Node, id: &str) -> Node {
    unchanged_on_error("delete", root, try_delete(root, id))
}

/// Deep-clone the subtree at `id` with fresh ids everywhere and insert the
/// clone right after the original. Returns the new root and the clone's id.
pub fn try_duplicate(root: &Node, id: &str, ids: &mut IdGenerator) -> TreeResult<(Node, String)> {
    if root.id == id {
        return Err(TreeError::ProtectedRoot);
    }
    let original = find_node(root, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    let mut clone = original.clone();

    let mut taken: HashSet<String> = collect_ids(root).into_iter().collect();
    ids.reassign_ids(&mut clone, &mut taken);
    let clone_id = clone.id.clone();

    let mut next = root.clone();
    let parent = find_parent_mut(&mut next, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    let pos = parent
        .children
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    parent.children.insert(pos + 1, clone);

    Ok((next, clone_id))
}

pub fn duplicate(root: &Node, id: &str, ids: &mut IdGenerator) -> Node {
    unchanged_on_error(
        "duplicate",
        root,
        try_duplicate(root, id, ids).map(|(next, _)| next),
    )
}

fn find_parent_mut<'a>(node: &'a mut Node, id: &str) -> Option<&'a mut Node> {
    if node.children.iter().any(|c| c.id == id) {
        return Some(node);
    }
    node.children
        .iter_mut()
        .find_map(|child| find_parent_mut(child, id))
}

/// Relocate `id` under `target_parent_id` at `target_index`
pub fn try_move_node(
    root: &Node,
    id: &str,
    target_parent_id: &str,
    target_index: isize,
) -> TreeResult<Node> {
    if root.id == id {
        return Err(TreeError::ProtectedRoot);
    }
    let moving = find_node(root, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    if !contains_node(root, target_parent_id) {
        return Err(TreeError::parent_not_found(target_parent_id));
    }
    if contains_node(moving, target_parent_id) {
        return Err(TreeError::CyclicMove {
            node_id: id.to_string(),
            target_parent_id: target_parent_id.to_string(),
        });
    }

    let mut next = root.clone();
    let detached = detach(&mut next, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    let parent = find_node_mut(&mut next, target_parent_id)
        .ok_or_else(|| TreeError::parent_not_found(target_parent_id))?;
    let at = clamp_index(Some(target_index), parent.children.len());
    parent.children.insert(at, detached);
    Ok(next)
}

pub fn move_node(root: &Node, id: &str, target_parent_id: &str, target_index: isize) -> Node {
    unchanged_on_error(
        "move",
        root,
        try_move_node(root, id, target_parent_id, target_index),
    )
}

/// Copy-on-write update of a single node at its tree position
pub fn try_update_node<F>(root: &Node, id: &str, update: F) -> TreeResult<Node>
where
    F: FnOnce(&Node) -> Node,
{
    let target = find_node(root, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    let replacement = update(target);
    let mut next = root.clone();
    let slot = find_node_mut(&mut next, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    *slot = replacement;
    Ok(next)
}

pub fn update_node<F>(root: &Node, id: &str, update: F) -> Node
where
    F: FnOnce(&Node) -> Node,
{
    unchanged_on_error("update", root, try_update_node(root, id, update))
}

fn unchanged_on_error(op: &str, root: &Node, result: TreeResult<Node>) -> Node {
    match result {
        Ok(next) => next,
        Err(err) => {
            debug!(operation = op, error = %err, "Tree operation ignored");
            root.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParentIssue;
    use crate::factory::{make_column, make_root, make_section, make_widget};
    use crate::node::{FieldMap, NodeKind};
    use serde_json::json;

    fn sample() -> Node {
        Node::new("root", NodeKind::Root)
            .with_child(
                Node::new("s1", NodeKind::Section).with_child(
                    Node::new("c1", NodeKind::Column)
                        .with_child(Node::widget("w1", "heading"))
                        .with_child(Node::widget("w2", "text")),
                ),
            )
            .with_child(Node::new("s2", NodeKind::Section).with_child(Node::new("c2", NodeKind::Column)))
    }

    fn child_ids(node: &Node) -> Vec<&str> {
        node.children.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_find_node() {
        let root = sample();
        assert_eq!(find_node(&root, "w2").map(|n| n.kind), Some(NodeKind::Widget));
        assert!(find_node(&root, "missing").is_none());
    }

    #[test]
    fn test_find_path_and_parent() {
        let root = sample();
        let path = find_path(&root, "w1").unwrap();
        let ids: Vec<&str> = path.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "s1", "c1", "w1"]);
        assert_eq!(find_parent(&root, "w1").unwrap().id, "c1");
        assert!(find_parent(&root, "root").is_none());
        assert!(find_path(&root, "nope").is_none());
    }

    #[test]
    fn test_insert_appends_by_default() {
        let root = sample();
        let next = insert(&root, "c1", Node::widget("w3", "button"), None);
        assert_eq!(child_ids(find_node(&next, "c1").unwrap()), vec!["w1", "w2", "w3"]);
        // input untouched
        assert_eq!(find_node(&root, "c1").unwrap().children.len(), 2);
    }

    #[test]
    fn test_insert_clamps_index() {
        let root = sample();
        let next = insert(&root, "c1", Node::widget("a", "icon"), Some(-4));
        assert_eq!(child_ids(find_node(&next, "c1").unwrap()), vec!["a", "w1", "w2"]);

        let next = insert(&root, "c1", Node::widget("b", "icon"), Some(99));
        assert_eq!(child_ids(find_node(&next, "c1").unwrap()), vec!["w1", "w2", "b"]);

        let next = insert(&root, "c1", Node::widget("c", "icon"), Some(1));
        assert_eq!(child_ids(find_node(&next, "c1").unwrap()), vec!["w1", "c", "w2"]);
    }

    #[test]
    fn test_insert_missing_parent() {
        let root = sample();
        let err = try_insert(&root, "ghost", Node::widget("x", "text"), None).unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidParent {
                parent_id: "ghost".to_string(),
                issue: ParentIssue::NotFound
            }
        );
        assert_eq!(insert(&root, "ghost", Node::widget("x", "text"), None), root);
    }

    #[test]
    fn test_delete_removes_subtree() {
        let root = sample();
        let next = delete_node(&root, "s1");
        for id in ["s1", "c1", "w1", "w2"] {
            assert!(find_node(&next, id).is_none(), "{} should be gone", id);
        }
        assert!(find_node(&next, "s2").is_some());
    }

    #[test]
    fn test_delete_root_and_missing_are_noops() {
        let root = sample();
        assert_eq!(try_delete(&root, "root"), Err(TreeError::ProtectedRoot));
        assert_eq!(delete_node(&root, "root"), root);
        assert_eq!(delete_node(&root, "missing"), root);
    }

    #[test]
    fn test_duplicate_inserts_fresh_sibling() {
        let root = sample();
        let mut ids = IdGenerator::from_seed("dup");
        let (next, clone_id) = try_duplicate(&root, "s1", &mut ids).unwrap();

        assert_eq!(child_ids(&next), vec!["s1", clone_id.as_str(), "s2"]);

        let original: HashSet<String> = collect_ids(find_node(&root, "s1").unwrap()).into_iter().collect();
        let cloned = collect_ids(find_node(&next, &clone_id).unwrap());
        assert_eq!(cloned.len(), original.len());
        assert!(cloned.iter().all(|id| !original.contains(id)));
    }

    #[test]
    fn test_duplicate_keeps_content() {
        let root = insert(
            &sample(),
            "c2",
            Node::widget("h", "heading").with_prop("content", "Sale").with_style("color", "red"),
            None,
        );
        let mut ids = IdGenerator::from_seed("dup");
        let (next, clone_id) = try_duplicate(&root, "h", &mut ids).unwrap();
        let clone = find_node(&next, &clone_id).unwrap();
        assert_eq!(clone.props["content"], json!("Sale"));
        assert_eq!(clone.style["color"], json!("red"));
    }

    #[test]
    fn test_duplicate_missing_is_noop() {
        let root = sample();
        let mut ids = IdGenerator::from_seed("dup");
        assert_eq!(duplicate(&root, "nope", &mut ids), root);
        assert_eq!(duplicate(&root, "root", &mut ids), root);
    }

    #[test]
    fn test_move_between_parents() {
        let root = sample();
        let next = move_node(&root, "w2", "c2", 0);
        assert_eq!(child_ids(find_node(&next, "c1").unwrap()), vec!["w1"]);
        assert_eq!(child_ids(find_node(&next, "c2").unwrap()), vec!["w2"]);
    }

    #[test]
    fn test_move_within_parent_reorders() {
        let root = sample();
        let next = move_node(&root, "w1", "c1", 5);
        assert_eq!(child_ids(find_node(&next, "c1").unwrap()), vec!["w2", "w1"]);
    }

    #[test]
    fn test_move_rejects_cycles() {
        let root = sample();
        assert!(matches!(
            try_move_node(&root, "s1", "c1", 0),
            Err(TreeError::CyclicMove { .. })
        ));
        assert!(matches!(
            try_move_node(&root, "s1", "s1", 0),
            Err(TreeError::CyclicMove { .. })
        ));
        assert_eq!(move_node(&root, "s1", "w1", 0), root);
    }

    #[test]
    fn test_move_with_unknown_ids_is_noop() {
        let root = sample();
        assert_eq!(move_node(&root, "ghost", "c2", 0), root);
        assert_eq!(move_node(&root, "w1", "ghost", 0), root);
        assert_eq!(try_move_node(&root, "root", "c2", 0), Err(TreeError::ProtectedRoot));
    }

    #[test]
    fn test_update_node_replaces_in_place() {
        let root = sample();
        let next = update_node(&root, "w1", |n| n.clone().with_prop("content", "Hello"));
        assert_eq!(find_node(&next, "w1").unwrap().props["content"], json!("Hello"));
        assert!(find_node(&root, "w1").unwrap().props.is_empty());
        assert_eq!(update_node(&root, "missing", |n| n.clone()), root);
    }

    #[test]
    fn test_scenario_build_page_from_empty_root() {
        let mut ids = IdGenerator::from_seed("page");
        let root = make_root(&mut ids);
        let root_id = root.id.clone();

        let section = make_section(&mut ids);
        let section_id = section.id.clone();
        let root = insert(&root, &root_id, section, None);

        let column = make_column(&mut ids);
        let column_id = column.id.clone();
        let root = insert(&root, &section_id, column, None);

        let props: FieldMap = [("content".to_string(), json!("Hi"))].into();
        let root = insert(&root, &column_id, make_widget(&mut ids, "heading", props), None);

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].children[0].props["content"], json!("Hi"));
    }
}
