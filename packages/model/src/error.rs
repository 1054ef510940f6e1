use crate::node::NodeKind;
use std::fmt;
use thiserror::Error;

/// Why a parent was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum ParentIssue {
    NotFound,
    Incompatible { parent: NodeKind, child: NodeKind },
}

impl fmt::Display for ParentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentIssue::NotFound => f.write_str("parent does not exist"),
            ParentIssue::Incompatible { parent, child } => {
                write!(f, "a {} cannot contain a {}", parent, child)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid parent {parent_id}: {issue}")]
    InvalidParent { parent_id: String, issue: ParentIssue },

    #[error("Moving {node_id} into {target_parent_id} would create a cycle")]
    CyclicMove {
        node_id: String,
        target_parent_id: String,
    },

    #[error("Operation not permitted on the root node")]
    ProtectedRoot,
}

impl TreeError {
    pub fn parent_not_found(parent_id: impl Into<String>) -> Self {
        TreeError::InvalidParent {
            parent_id: parent_id.into(),
            issue: ParentIssue::NotFound,
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
