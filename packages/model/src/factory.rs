//! Constructors for well-formed empty nodes with fresh ids.

use crate::id_generator::IdGenerator;
use crate::node::{FieldMap, Node, NodeKind};

pub fn make_root(ids: &mut IdGenerator) -> Node {
    Node::new(ids.new_id(), NodeKind::Root)
}

pub fn make_section(ids: &mut IdGenerator) -> Node {
    Node::new(ids.new_id(), NodeKind::Section)
}

pub fn make_column(ids: &mut IdGenerator) -> Node {
    Node::new(ids.new_id(), NodeKind::Column)
}

pub fn make_widget(ids: &mut IdGenerator, widget_type: &str, initial_props: FieldMap) -> Node {
    let mut node = Node::widget(ids.new_id(), widget_type);
    node.props = initial_props;
    node
}

/// A section pre-filled with `columns` empty columns
pub fn make_section_with_columns(ids: &mut IdGenerator, columns: usize) -> Node {
    let mut section = make_section(ids);
    for _ in 0..columns {
        section.children.push(make_column(ids));
    }
    section
}
