//! # Page Tree Nodes
//!
//! A page is a single recursive tree of [`Node`]s:
//!
//! ```text
//! root
//!  └─ section
//!      └─ column
//!          └─ widget (heading, text, button, ...)
//! ```
//!
//! Every node carries three field buckets at the desktop baseline
//! (`props`, `style`, `advanced`) plus per-breakpoint overrides for the
//! two visual buckets in `responsive`. A missing breakpoint entry, or a
//! missing field inside one, means "use the desktop value".

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field name → value mapping used by every bucket
pub type FieldMap = BTreeMap<String, Value>;

/// Structural role of a node in the page tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Section,
    Column,
    Widget,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Section => "section",
            NodeKind::Column => "column",
            NodeKind::Widget => "widget",
        }
    }

    /// Whether a node of this kind may directly hold a node of `child` kind.
    ///
    /// Tree operations do not enforce this; the editor checks it before
    /// inserting or moving.
    pub fn can_contain(&self, child: NodeKind) -> bool {
        matches!(
            (self, child),
            (NodeKind::Root, NodeKind::Section)
                | (NodeKind::Section, NodeKind::Column)
                | (NodeKind::Column, NodeKind::Widget)
        )
    }

    pub fn is_container(&self) -> bool {
        !matches!(self, NodeKind::Widget)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Responsive viewport tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 3] = [Breakpoint::Desktop, Breakpoint::Tablet, Breakpoint::Mobile];

    /// Breakpoints that can carry overrides (desktop is the baseline)
    pub const RESPONSIVE: [Breakpoint; 2] = [Breakpoint::Tablet, Breakpoint::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Desktop => "desktop",
            Breakpoint::Tablet => "tablet",
            Breakpoint::Mobile => "mobile",
        }
    }

    pub fn is_desktop(&self) -> bool {
        matches!(self, Breakpoint::Desktop)
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Breakpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" => Ok(Breakpoint::Desktop),
            "tablet" => Ok(Breakpoint::Tablet),
            "mobile" => Ok(Breakpoint::Mobile),
            other => Err(format!(
                "Invalid breakpoint: {}. Use: desktop, tablet, or mobile",
                other
            )),
        }
    }
}

/// One of the two visual buckets subject to responsive overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Style,
    Advanced,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Style, Bucket::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Style => "style",
            Bucket::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overrides for one breakpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketOverrides {
    #[serde(default)]
    pub style: FieldMap,
    #[serde(default)]
    pub advanced: FieldMap,
}

impl BucketOverrides {
    pub fn bucket(&self, bucket: Bucket) -> &FieldMap {
        match bucket {
            Bucket::Style => &self.style,
            Bucket::Advanced => &self.advanced,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut FieldMap {
        match bucket {
            Bucket::Style => &mut self.style,
            Bucket::Advanced => &mut self.advanced,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_empty() && self.advanced.is_empty()
    }
}

/// Per-breakpoint overrides. Desktop never appears here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Responsive {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablet: Option<BucketOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<BucketOverrides>,
}

impl Responsive {
    pub fn get(&self, breakpoint: Breakpoint) -> Option<&BucketOverrides> {
        match breakpoint {
            Breakpoint::Desktop => None,
            Breakpoint::Tablet => self.tablet.as_ref(),
            Breakpoint::Mobile => self.mobile.as_ref(),
        }
    }

    /// Slot for a breakpoint's overrides; `None` for desktop
    pub fn slot_mut(&mut self, breakpoint: Breakpoint) -> Option<&mut Option<BucketOverrides>> {
        match breakpoint {
            Breakpoint::Desktop => None,
            Breakpoint::Tablet => Some(&mut self.tablet),
            Breakpoint::Mobile => Some(&mut self.mobile),
        }
    }

    /// True when no breakpoint carries any override field
    pub fn is_empty(&self) -> bool {
        Breakpoint::RESPONSIVE
            .iter()
            .all(|bp| self.get(*bp).map_or(true, BucketOverrides::is_empty))
    }
}

/// A single element of the page tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    #[serde(rename = "widgetType", default, skip_serializing_if = "Option::is_none")]
    pub widget_type: Option<String>,
    #[serde(default)]
    pub props: FieldMap,
    #[serde(default)]
    pub style: FieldMap,
    #[serde(default)]
    pub advanced: FieldMap,
    #[serde(default)]
    pub responsive: Responsive,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty node of the given kind
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            widget_type: None,
            props: FieldMap::new(),
            style: FieldMap::new(),
            advanced: FieldMap::new(),
            responsive: Responsive::default(),
            children: Vec::new(),
        }
    }

    pub fn widget(id: impl Into<String>, widget_type: impl Into<String>) -> Self {
        let mut node = Self::new(id, NodeKind::Widget);
        node.widget_type = Some(widget_type.into());
        node
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    pub fn with_advanced(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.advanced.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Desktop baseline for a bucket
    pub fn bucket(&self, bucket: Bucket) -> &FieldMap {
        match bucket {
            Bucket::Style => &self.style,
            Bucket::Advanced => &self.advanced,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut FieldMap {
        match bucket {
            Bucket::Style => &mut self.style,
            Bucket::Advanced => &mut self.advanced,
        }
    }

    /// Override map for a breakpoint bucket, if one exists
    pub fn overrides(&self, breakpoint: Breakpoint, bucket: Bucket) -> Option<&FieldMap> {
        self.responsive.get(breakpoint).map(|o| o.bucket(bucket))
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    pub fn is_widget(&self) -> bool {
        self.kind == NodeKind::Widget
    }

    pub fn has_responsive_overrides(&self) -> bool {
        !self.responsive.is_empty()
    }

    /// Schema lookup key: the widget type for widgets, the kind otherwise
    pub fn schema_key(&self) -> &str {
        match (&self.kind, &self.widget_type) {
            (NodeKind::Widget, Some(widget_type)) => widget_type,
            (kind, _) => kind.as_str(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Storage envelope used by the page persistence API: `{ "tree": Node }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub tree: Node,
}

impl PageDocument {
    pub fn new(tree: Node) -> Self {
        Self { tree }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> Node {
        let mut heading = Node::widget("w1", "heading")
            .with_prop("content", "Hi")
            .with_style("fontSize", "40px")
            .with_style(
                "padding",
                json!({"top": 10, "right": 10, "bottom": 10, "left": 10}),
            );
        heading.responsive.tablet = Some(BucketOverrides {
            style: [("fontSize".to_string(), json!("32px"))].into(),
            advanced: FieldMap::new(),
        });
        heading.responsive.mobile = Some(BucketOverrides::default());

        Node::new("root", NodeKind::Root).with_child(
            Node::new("s1", NodeKind::Section)
                .with_advanced("gap", 20)
                .with_child(Node::new("c1", NodeKind::Column).with_child(heading)),
        )
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let tree = sample_tree();
        let json = tree.to_json().unwrap();
        let back = Node::from_json(&json).unwrap();
        assert_eq!(tree, back);
    }

    #[test]
    fn test_absent_optional_keys_read_as_empty() {
        let node = Node::from_json(r#"{"id": "s1", "kind": "section"}"#).unwrap();
        assert_eq!(node.kind, NodeKind::Section);
        assert!(node.widget_type.is_none());
        assert!(node.props.is_empty());
        assert!(node.children.is_empty());
        assert!(node.responsive.is_empty());
    }

    #[test]
    fn test_missing_bucket_inside_breakpoint_reads_as_empty() {
        let node = Node::from_json(
            r#"{"id": "w", "kind": "widget", "widgetType": "text",
                "responsive": {"mobile": {"style": {"color": "red"}}}}"#,
        )
        .unwrap();
        let mobile = node.responsive.mobile.as_ref().unwrap();
        assert_eq!(mobile.style.get("color"), Some(&json!("red")));
        assert!(mobile.advanced.is_empty());
    }

    #[test]
    fn test_wire_shape_uses_camel_case_widget_type() {
        let node = Node::widget("w1", "button");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["widgetType"], json!("button"));
        assert_eq!(value["kind"], json!("widget"));
        assert_eq!(value["responsive"], json!({}));
    }

    #[test]
    fn test_kind_containment_rules() {
        assert!(NodeKind::Root.can_contain(NodeKind::Section));
        assert!(NodeKind::Section.can_contain(NodeKind::Column));
        assert!(NodeKind::Column.can_contain(NodeKind::Widget));
        assert!(!NodeKind::Root.can_contain(NodeKind::Widget));
        assert!(!NodeKind::Section.can_contain(NodeKind::Widget));
        assert!(!NodeKind::Widget.can_contain(NodeKind::Widget));
    }

    #[test]
    fn test_breakpoint_parsing() {
        assert_eq!("Mobile".parse::<Breakpoint>(), Ok(Breakpoint::Mobile));
        assert!("watch".parse::<Breakpoint>().is_err());
    }

    #[test]
    fn test_empty_override_entries_count_as_no_overrides() {
        let mut node = Node::new("c", NodeKind::Column);
        node.responsive.tablet = Some(BucketOverrides::default());
        assert!(!node.has_responsive_overrides());
    }

    #[test]
    fn test_page_document_envelope() {
        let doc = PageDocument::new(Node::new("root", NodeKind::Root));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["tree"]["kind"], json!("root"));
    }
}
