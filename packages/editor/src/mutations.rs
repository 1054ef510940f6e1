//! # Page Mutations
//!
//! Editor commands over the page tree. Each variant maps onto one tree
//! operation or cascade edit.
//!
//! ## Mutation Semantics
//!
//! ### Insert / Move
//! - Parent must exist and accept the child's kind
//!   (root → section → column → widget)
//! - Inserted subtrees whose ids collide with the page are re-keyed
//! - Moves into the moved subtree are rejected
//!
//! ### Update*
//! - Values are merged into the bucket; `null` removes a field
//! - Responsive updates on `desktop` write the baseline
//!
//! ### Clear*
//! - Removes one override; an emptied breakpoint entry is dropped

use pagebuilder_evaluator::{clear_override, set_override};
use pagebuilder_model::{
    collect_ids, find_node, try_delete, try_duplicate, try_insert, try_move_node, try_update_node,
    Breakpoint, Bucket, FieldMap, IdGenerator, Node, NodeKind, ParentIssue, TreeError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Commands accepted by the builder store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a node (and its subtree) under a parent
    #[serde(rename_all = "camelCase")]
    InsertNode {
        parent_id: String,
        node: Node,
        #[serde(default)]
        index: Option<isize>,
    },

    /// Remove a node and its subtree
    #[serde(rename_all = "camelCase")]
    DeleteNode { node_id: String },

    /// Clone a subtree next to the original
    #[serde(rename_all = "camelCase")]
    DuplicateNode { node_id: String },

    /// Relocate a node under a new parent
    #[serde(rename_all = "camelCase")]
    MoveNode {
        node_id: String,
        target_parent_id: String,
        index: isize,
    },

    #[serde(rename_all = "camelCase")]
    UpdateProps { node_id: String, values: FieldMap },

    #[serde(rename_all = "camelCase")]
    UpdateStyle { node_id: String, values: FieldMap },

    #[serde(rename_all = "camelCase")]
    UpdateAdvanced { node_id: String, values: FieldMap },

    #[serde(rename_all = "camelCase")]
    UpdateResponsiveStyle {
        node_id: String,
        breakpoint: Breakpoint,
        values: FieldMap,
    },

    #[serde(rename_all = "camelCase")]
    UpdateResponsiveAdvanced {
        node_id: String,
        breakpoint: Breakpoint,
        values: FieldMap,
    },

    #[serde(rename_all = "camelCase")]
    ClearResponsiveStyle {
        node_id: String,
        breakpoint: Breakpoint,
        field: String,
    },

    #[serde(rename_all = "camelCase")]
    ClearResponsiveAdvanced {
        node_id: String,
        breakpoint: Breakpoint,
        field: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Mutation changed nothing")]
    Unchanged,
}

/// Result of applying a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub root: Node,
    /// Id of a node the mutation created (insert, duplicate)
    pub created: Option<String>,
}

impl Applied {
    fn changed(root: Node) -> Self {
        Self { root, created: None }
    }
}

impl Mutation {
    /// Node the mutation addresses
    pub fn target_id(&self) -> &str {
        match self {
            Mutation::InsertNode { parent_id, .. } => parent_id,
            Mutation::DeleteNode { node_id }
            | Mutation::DuplicateNode { node_id }
            | Mutation::MoveNode { node_id, .. }
            | Mutation::UpdateProps { node_id, .. }
            | Mutation::UpdateStyle { node_id, .. }
            | Mutation::UpdateAdvanced { node_id, .. }
            | Mutation::UpdateResponsiveStyle { node_id, .. }
            | Mutation::UpdateResponsiveAdvanced { node_id, .. }
            | Mutation::ClearResponsiveStyle { node_id, .. }
            | Mutation::ClearResponsiveAdvanced { node_id, .. } => node_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNode { .. } => "insertNode",
            Mutation::DeleteNode { .. } => "deleteNode",
            Mutation::DuplicateNode { .. } => "duplicateNode",
            Mutation::MoveNode { .. } => "moveNode",
            Mutation::UpdateProps { .. } => "updateProps",
            Mutation::UpdateStyle { .. } => "updateStyle",
            Mutation::UpdateAdvanced { .. } => "updateAdvanced",
            Mutation::UpdateResponsiveStyle { .. } => "updateResponsiveStyle",
            Mutation::UpdateResponsiveAdvanced { .. } => "updateResponsiveAdvanced",
            Mutation::ClearResponsiveStyle { .. } => "clearResponsiveStyle",
            Mutation::ClearResponsiveAdvanced { .. } => "clearResponsiveAdvanced",
        }
    }

    /// Validate structural constraints before applying
    pub fn validate(&self, root: &Node) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNode { parent_id, node, .. } => {
                if node.kind == NodeKind::Root {
                    return Err(MutationError::InvalidNode(
                        "a page has exactly one root".to_string(),
                    ));
                }
                let parent = find_node(root, parent_id).ok_or_else(|| TreeError::parent_not_found(parent_id))?;
                check_containment(parent_id, parent.kind, node.kind)
            }

            Mutation::MoveNode {
                node_id,
                target_parent_id,
                ..
            } => {
                let node = find_node(root, node_id).ok_or_else(|| TreeError::NodeNotFound(node_id.clone()))?;
                let parent = find_node(root, target_parent_id)
                    .ok_or_else(|| TreeError::parent_not_found(target_parent_id))?;
                check_containment(target_parent_id, parent.kind, node.kind)
            }

            other => {
                let id = other.target_id();
                if find_node(root, id).is_none() {
                    return Err(TreeError::NodeNotFound(id.to_string()).into());
                }
                Ok(())
            }
        }
    }

    /// Apply to `root`, returning the new root. The input is never modified.
    pub fn apply(&self, root: &Node, ids: &mut IdGenerator) -> Result<Applied, MutationError> {
        self.validate(root)?;

        let applied = match self {
            Mutation::InsertNode {
                parent_id,
                node,
                index,
            } => {
                let node = rekey_collisions(root, node.clone(), ids);
                let created = node.id.clone();
                Applied {
                    root: try_insert(root, parent_id, node, *index)?,
                    created: Some(created),
                }
            }

            Mutation::DeleteNode { node_id } => Applied::changed(try_delete(root, node_id)?),

            Mutation::DuplicateNode { node_id } => {
                let (next, clone_id) = try_duplicate(root, node_id, ids)?;
                Applied {
                    root: next,
                    created: Some(clone_id),
                }
            }

            Mutation::MoveNode {
                node_id,
                target_parent_id,
                index,
            } => Applied::changed(try_move_node(root, node_id, target_parent_id, *index)?),

            Mutation::UpdateProps { node_id, values } => Applied::changed(try_update_node(root, node_id, |n| {
                let mut next = n.clone();
                merge_fields(&mut next.props, values);
                next
            })?),

            Mutation::UpdateStyle { node_id, values } => {
                Applied::changed(update_responsive(root, node_id, Breakpoint::Desktop, Bucket::Style, values)?)
            }

            Mutation::UpdateAdvanced { node_id, values } => {
                Applied::changed(update_responsive(root, node_id, Breakpoint::Desktop, Bucket::Advanced, values)?)
            }

            Mutation::UpdateResponsiveStyle {
                node_id,
                breakpoint,
                values,
            } => Applied::changed(update_responsive(root, node_id, *breakpoint, Bucket::Style, values)?),

            Mutation::UpdateResponsiveAdvanced {
                node_id,
                breakpoint,
                values,
            } => Applied::changed(update_responsive(root, node_id, *breakpoint, Bucket::Advanced, values)?),

            Mutation::ClearResponsiveStyle {
                node_id,
                breakpoint,
                field,
            } => Applied::changed(try_update_node(root, node_id, |n| {
                clear_override(n, field, *breakpoint, Bucket::Style)
            })?),

            Mutation::ClearResponsiveAdvanced {
                node_id,
                breakpoint,
                field,
            } => Applied::changed(try_update_node(root, node_id, |n| {
                clear_override(n, field, *breakpoint, Bucket::Advanced)
            })?),
        };

        if applied.root == *root {
            return Err(MutationError::Unchanged);
        }
        Ok(applied)
    }
}

fn check_containment(parent_id: &str, parent: NodeKind, child: NodeKind) -> Result<(), MutationError> {
    if parent.can_contain(child) {
        Ok(())
    } else {
        Err(TreeError::InvalidParent {
            parent_id: parent_id.to_string(),
            issue: ParentIssue::Incompatible { parent, child },
        }
        .into())
    }
}

/// Merge `values` into `fields`; `null` deletes
fn merge_fields(fields: &mut FieldMap, values: &FieldMap) {
    for (key, value) in values {
        if value.is_null() {
            fields.remove(key);
        } else {
            fields.insert(key.clone(), value.clone());
        }
    }
}

fn update_responsive(
    root: &Node,
    node_id: &str,
    breakpoint: Breakpoint,
    bucket: Bucket,
    values: &FieldMap,
) -> Result<Node, TreeError> {
    try_update_node(root, node_id, |n| {
        values.iter().fold(n.clone(), |node, (field, value)| match value {
            Value::Null => clear_override(&node, field, breakpoint, bucket),
            value => set_override(&node, field, breakpoint, bucket, value.clone()),
        })
    })
}

/// Give the incoming subtree fresh ids if any of them is already used
/// (by the page or twice within the subtree)
fn rekey_collisions(root: &Node, mut node: Node, ids: &mut IdGenerator) -> Node {
    let mut taken: HashSet<String> = collect_ids(root).into_iter().collect();
    let incoming = collect_ids(&node);
    let mut seen = HashSet::new();
    let collides = incoming
        .iter()
        .any(|id| id.is_empty() || taken.contains(id) || !seen.insert(id.as_str()));

    if collides {
        tracing::debug!(node_id = %node.id, "Re-keying inserted subtree");
        ids.reassign_ids(&mut node, &mut taken);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> Node {
        Node::new("root", NodeKind::Root).with_child(
            Node::new("s", NodeKind::Section).with_child(
                Node::new("c", NodeKind::Column)
                    .with_child(Node::widget("h", "heading").with_style("fontSize", "40px")),
            ),
        )
    }

    fn ids() -> IdGenerator {
        IdGenerator::from_seed("t")
    }

    #[test]
    fn test_insert_checks_kind_compatibility() {
        let mutation = Mutation::InsertNode {
            parent_id: "root".into(),
            node: Node::widget("w", "text"),
            index: None,
        };
        assert!(matches!(
            mutation.apply(&page(), &mut ids()),
            Err(MutationError::Tree(TreeError::InvalidParent {
                issue: ParentIssue::Incompatible { .. },
                ..
            }))
        ));

        let mutation = Mutation::InsertNode {
            parent_id: "c".into(),
            node: Node::widget("w", "text"),
            index: Some(0),
        };
        let applied = mutation.apply(&page(), &mut ids()).unwrap();
        assert_eq!(applied.created.as_deref(), Some("w"));
        assert_eq!(find_node(&applied.root, "c").unwrap().children[0].id, "w");
    }

    #[test]
    fn test_insert_rekeys_colliding_ids() {
        let mutation = Mutation::InsertNode {
            parent_id: "c".into(),
            node: Node::widget("h", "text"),
            index: None,
        };
        let applied = mutation.apply(&page(), &mut ids()).unwrap();
        let created = applied.created.unwrap();
        assert_ne!(created, "h");
        let all = collect_ids(&applied.root);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
    }

    #[test]
    fn test_insert_rejects_second_root() {
        let mutation = Mutation::InsertNode {
            parent_id: "root".into(),
            node: Node::new("r2", NodeKind::Root),
            index: None,
        };
        assert!(matches!(
            mutation.apply(&page(), &mut ids()),
            Err(MutationError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_move_checks_kind_and_cycles() {
        let root = page().with_child(Node::new("s2", NodeKind::Section));
        let into_section = Mutation::MoveNode {
            node_id: "h".into(),
            target_parent_id: "s2".into(),
            index: 0,
        };
        assert!(into_section.apply(&root, &mut ids()).is_err());

        let cyclic = Mutation::MoveNode {
            node_id: "s".into(),
            target_parent_id: "c".into(),
            index: 0,
        };
        assert!(cyclic.apply(&root, &mut ids()).is_err());
    }

    #[test]
    fn test_update_merges_and_null_removes() {
        let values: FieldMap = [
            ("color".to_string(), json!("red")),
            ("fontSize".to_string(), Value::Null),
        ]
        .into();
        let applied = Mutation::UpdateStyle {
            node_id: "h".into(),
            values,
        }
        .apply(&page(), &mut ids())
        .unwrap();
        let h = find_node(&applied.root, "h").unwrap();
        assert_eq!(h.style.get("color"), Some(&json!("red")));
        assert!(!h.style.contains_key("fontSize"));
    }

    #[test]
    fn test_responsive_update_and_clear() {
        let values: FieldMap = [("fontSize".to_string(), json!("14px"))].into();
        let applied = Mutation::UpdateResponsiveStyle {
            node_id: "h".into(),
            breakpoint: Breakpoint::Mobile,
            values,
        }
        .apply(&page(), &mut ids())
        .unwrap();
        let h = find_node(&applied.root, "h").unwrap();
        assert_eq!(h.overrides(Breakpoint::Mobile, Bucket::Style).unwrap()["fontSize"], json!("14px"));

        let cleared = Mutation::ClearResponsiveStyle {
            node_id: "h".into(),
            breakpoint: Breakpoint::Mobile,
            field: "fontSize".into(),
        }
        .apply(&applied.root, &mut ids())
        .unwrap();
        assert!(find_node(&cleared.root, "h").unwrap().responsive.is_empty());
    }

    #[test]
    fn test_stale_ids_and_noops_are_errors() {
        let delete = Mutation::DeleteNode { node_id: "gone".into() };
        assert_eq!(
            delete.apply(&page(), &mut ids()),
            Err(MutationError::Tree(TreeError::NodeNotFound("gone".into())))
        );

        let clear = Mutation::ClearResponsiveStyle {
            node_id: "h".into(),
            breakpoint: Breakpoint::Tablet,
            field: "fontSize".into(),
        };
        assert_eq!(clear.apply(&page(), &mut ids()), Err(MutationError::Unchanged));
    }

    #[test]
    fn test_wire_format() {
        let mutation: Mutation = serde_json::from_value(json!({
            "type": "updateResponsiveStyle",
            "nodeId": "h",
            "breakpoint": "tablet",
            "values": { "fontSize": "32px" }
        }))
        .unwrap();
        assert_eq!(mutation.name(), "updateResponsiveStyle");
        assert_eq!(mutation.target_id(), "h");

        let insert: Mutation = serde_json::from_value(json!({
            "type": "insertNode",
            "parentId": "c",
            "node": { "id": "w", "kind": "widget", "widgetType": "text" }
        }))
        .unwrap();
        assert!(matches!(insert, Mutation::InsertNode { index: None, .. }));
    }
}
