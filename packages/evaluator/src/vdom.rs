use crate::css::StyleFragment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Virtual DOM node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// HTML element
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        /// Inline (desktop or device-resolved) styles, kebab-case
        styles: BTreeMap<String, String>,
        children: Vec<VNode>,
        /// Page node this element renders, absent for inner widget markup
        #[serde(rename = "nodeId", skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
    },

    /// Text node
    Text { content: String },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
            node_id: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element { ref mut styles, .. } = self {
            styles.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn with_node_id(mut self, id: impl Into<String>) -> Self {
        if let VNode::Element {
            node_id: ref mut slot,
            ..
        } = self
        {
            *slot = Some(id.into());
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Text { .. } => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            VNode::Text { .. } => None,
        }
    }

    pub fn style(&self, key: &str) -> Option<&str> {
        match self {
            VNode::Element { styles, .. } => styles.get(key).map(String::as_str),
            VNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            VNode::Text { .. } => &[],
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map_or(false, |list| list.split_whitespace().any(|c| c == class))
    }

    /// `display:flex;flex-direction:column` style attribute text
    pub fn inline_style(&self) -> String {
        match self {
            VNode::Element { styles, .. } => styles
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join(";"),
            VNode::Text { .. } => String::new(),
        }
    }

    /// Depth-first search for the element rendering page node `id`
    pub fn find_by_node_id(&self, id: &str) -> Option<&VNode> {
        if let VNode::Element { node_id: Some(own), .. } = self {
            if own == id {
                return Some(self);
            }
        }
        self.children().iter().find_map(|c| c.find_by_node_id(id))
    }

    /// Concatenated text content of the subtree
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content } => content.clone(),
            VNode::Element { children, .. } => children.iter().map(VNode::text_content).collect(),
        }
    }
}

/// Rendered page: the element tree plus the responsive fragments it needs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VirtualDomDocument {
    pub nodes: Vec<VNode>,
    pub fragments: Vec<StyleFragment>,
}

impl VirtualDomDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: VNode) {
        self.nodes.push(node);
    }

    pub fn add_fragment(&mut self, fragment: StyleFragment) {
        self.fragments.push(fragment);
    }

    pub fn find_by_node_id(&self, id: &str) -> Option<&VNode> {
        self.nodes.iter().find_map(|n| n.find_by_node_id(id))
    }

    pub fn fragment_for(&self, node_id: &str) -> Option<&StyleFragment> {
        self.fragments.iter().find(|f| f.node_id == node_id)
    }

    /// All fragment CSS in document order
    pub fn stylesheet(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.css.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
