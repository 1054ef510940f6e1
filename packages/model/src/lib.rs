//! # Page Builder Model
//!
//! The page tree shared by the editor canvas and the live storefront.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Node tree + tree operations          │
//! │  - Node / kinds / breakpoints / buckets     │
//! │  - find / insert / delete / duplicate / move│
//! │  - id generation, validation, schemas       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ evaluator: cascade + render + CSS fragments │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: builder store, history, persistence │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! 1. Exactly one `root`, at the top, never deleted
//! 2. `section` holds columns, `column` holds widgets, widgets hold nothing
//! 3. Node ids are unique across the tree
//! 4. Tree operations return a new root and never modify their input

pub mod error;
pub mod factory;
pub mod id_generator;
pub mod node;
pub mod schema;
pub mod style_value;
pub mod tree;
pub mod validate;
pub mod visitor;

pub use error::{ParentIssue, TreeError, TreeResult};
pub use factory::{make_column, make_root, make_section, make_section_with_columns, make_widget};
pub use id_generator::{get_session_seed, IdGenerator};
pub use node::{Breakpoint, Bucket, BucketOverrides, FieldMap, Node, NodeKind, PageDocument, Responsive};
pub use schema::{ControlSchema, Field, FieldOption, FieldType, SchemaRegistry};
pub use style_value::{format_number, Border, BoxEdges, FieldCategory, Scalar, Shadow, StyleValue};
pub use tree::{
    contains_node, delete_node, duplicate, find_node, find_node_mut, find_parent, find_path,
    insert, is_in_subtree, move_node, try_delete, try_duplicate, try_insert, try_move_node,
    try_update_node, update_node,
};
pub use validate::{validate, validate_with_schema, ValidationIssue, ValidationLevel, Validator};
pub use visitor::{collect_ids, count_nodes, max_depth, walk_node, walk_node_mut, Visitor, VisitorMut};
