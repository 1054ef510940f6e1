use crate::node::Node;

/// Visitor pattern for traversing a page tree immutably
///
/// The default implementation walks the whole tree depth-first, parents
/// before children. Override `visit_node` to act on each node and call
/// [`walk_node`] to keep descending.
pub trait Visitor: Sized {
    fn visit_node(&mut self, node: &Node, depth: usize) {
        walk_node(self, node, depth);
    }
}

/// Mutable visitor for in-place transforms of a (cloned) tree
pub trait VisitorMut: Sized {
    fn visit_node_mut(&mut self, node: &mut Node, depth: usize) {
        walk_node_mut(self, node, depth);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node, depth: usize) {
    for child in &node.children {
        visitor.visit_node(child, depth + 1);
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut Node, depth: usize) {
    for child in &mut node.children {
        visitor.visit_node_mut(child, depth + 1);
    }
}

struct IdCollector {
    ids: Vec<String>,
}

impl Visitor for IdCollector {
    fn visit_node(&mut self, node: &Node, depth: usize) {
        self.ids.push(node.id.clone());
        walk_node(self, node, depth);
    }
}

/// All ids in the tree, in depth-first pre-order
pub fn collect_ids(root: &Node) -> Vec<String> {
    let mut collector = IdCollector { ids: Vec::new() };
    collector.visit_node(root, 0);
    collector.ids
}

struct Counter {
    count: usize,
    max_depth: usize,
}

impl Visitor for Counter {
    fn visit_node(&mut self, node: &Node, depth: usize) {
        self.count += 1;
        self.max_depth = self.max_depth.max(depth);
        walk_node(self, node, depth);
    }
}

/// Number of nodes in the tree, root included
pub fn count_nodes(root: &Node) -> usize {
    let mut counter = Counter {
        count: 0,
        max_depth: 0,
    };
    counter.visit_node(root, 0);
    counter.count
}

/// Depth of the deepest node (root is depth 0)
pub fn max_depth(root: &Node) -> usize {
    let mut counter = Counter {
        count: 0,
        max_depth: 0,
    };
    counter.visit_node(root, 0);
    counter.max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    fn tree() -> Node {
        Node::new("r", NodeKind::Root).with_child(
            Node::new("s", NodeKind::Section).with_child(
                Node::new("c", NodeKind::Column)
                    .with_child(Node::widget("w1", "text"))
                    .with_child(Node::widget("w2", "icon")),
            ),
        )
    }

    #[test]
    fn test_collect_ids_pre_order() {
        assert_eq!(collect_ids(&tree()), vec!["r", "s", "c", "w1", "w2"]);
    }

    #[test]
    fn test_count_and_depth() {
        assert_eq!(count_nodes(&tree()), 5);
        assert_eq!(max_depth(&tree()), 3);
    }

    #[test]
    fn test_mutable_visitor_rewrites_ids() {
        struct Prefixer;
        impl VisitorMut for Prefixer {
            fn visit_node_mut(&mut self, node: &mut Node, depth: usize) {
                node.id = format!("p-{}", node.id);
                walk_node_mut(self, node, depth);
            }
        }

        let mut root = tree();
        Prefixer.visit_node_mut(&mut root, 0);
        assert_eq!(collect_ids(&root)[4], "p-w2");
    }
}
