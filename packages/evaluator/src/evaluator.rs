//! # Page Evaluator
//!
//! Walks a page tree and produces a [`VirtualDomDocument`]: one element per
//! node carrying its resolved inline style, plus the responsive stylesheet
//! fragments for every node with tablet/mobile overrides or visibility flags.
//!
//! ## Modes
//!
//! - **Live**: the storefront. Inline styles are always the desktop baseline;
//!   smaller viewports are handled entirely by the `@media` fragments.
//! - **Editor**: the builder canvas previewing one device. Inline styles are
//!   resolved for the previewed breakpoint and elements carry `data-node-id`
//!   so the canvas can map clicks back to nodes.
//!
//! ## Determinism
//!
//! For the same tree, config and context the output is identical on every
//! call: attribute and style maps are ordered, fragments follow pre-order.
//!
//! ## Containers vs leaves
//!
//! Every node's style is computed from that node alone. A container's
//! background or padding is never copied onto its children.

use crate::cascade::CascadeResolver;
use crate::config::RenderConfig;
use crate::css::{build_fragment, inline_declarations, is_hidden_at, StyleFragment};
use crate::utils::compute_class_name;
use crate::vdom::{VNode, VirtualDomDocument};
use crate::widgets::{WidgetContext, WidgetRegistry};
use pagebuilder_model::{walk_node, Breakpoint, Bucket, Node, NodeKind, PageDocument, SchemaRegistry, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "header", "footer", "article", "aside", "main", "nav",
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid page document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("Page tree must start with a root node, found {found}")]
    NotRoot { found: NodeKind },
}

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Editor,
    #[default]
    Live,
}

/// Evaluation context for one render pass
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub breakpoint: Breakpoint,
    pub mode: RenderMode,
    /// Node highlighted on the editor canvas
    pub selected: Option<String>,
}

impl EvalContext {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn editor(breakpoint: Breakpoint) -> Self {
        Self {
            breakpoint,
            mode: RenderMode::Editor,
            selected: None,
        }
    }

    pub fn with_selected(mut self, node_id: impl Into<String>) -> Self {
        self.selected = Some(node_id.into());
        self
    }

    /// Breakpoint used for inline styles
    pub fn style_breakpoint(&self) -> Breakpoint {
        match self.mode {
            RenderMode::Live => Breakpoint::Desktop,
            RenderMode::Editor => self.breakpoint,
        }
    }
}

/// Parse a stored page: either `{ "tree": Node }` or a bare root node
pub fn parse_page(json: &str) -> RenderResult<Node> {
    let value: Value = serde_json::from_str(json)?;
    let root: Node = if value.get("tree").is_some() {
        serde_json::from_value::<PageDocument>(value)?.tree
    } else {
        serde_json::from_value(value)?
    };

    if root.kind != NodeKind::Root {
        return Err(RenderError::NotRoot { found: root.kind });
    }
    Ok(root)
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: RenderConfig,
    schema: Option<Arc<SchemaRegistry>>,
    widgets: WidgetRegistry,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: Arc<SchemaRegistry>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_widgets(mut self, widgets: WidgetRegistry) -> Self {
        self.widgets = widgets;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn resolver(&self) -> CascadeResolver<'_> {
        CascadeResolver::new(self.schema.as_deref())
    }

    #[instrument(skip_all, fields(root_id = %root.id, breakpoint = %ctx.breakpoint, mode = ?ctx.mode))]
    pub fn evaluate(&self, root: &Node, ctx: &EvalContext) -> VirtualDomDocument {
        let mut doc = VirtualDomDocument::new();
        doc.add_node(self.render_node(root, ctx));
        for fragment in self.fragments(root) {
            doc.add_fragment(fragment);
        }
        debug!(fragments = doc.fragments.len(), "Evaluated page");
        doc
    }

    pub fn evaluate_json(&self, json: &str, ctx: &EvalContext) -> RenderResult<VirtualDomDocument> {
        let root = parse_page(json)?;
        Ok(self.evaluate(&root, ctx))
    }

    /// Responsive fragments for every node of the tree, in pre-order
    pub fn fragments(&self, root: &Node) -> Vec<StyleFragment> {
        struct Collect<'e> {
            evaluator: &'e Evaluator,
            out: Vec<StyleFragment>,
        }

        impl Visitor for Collect<'_> {
            fn visit_node(&mut self, node: &Node, _depth: usize) {
                if let Some(fragment) = build_fragment(node, &self.evaluator.resolver(), &self.evaluator.config) {
                    self.out.push(fragment);
                }
            }
        }

        let mut collect = Collect {
            evaluator: self,
            out: Vec::new(),
        };
        walk_node(&mut collect, root, 0);
        collect.out
    }

    /// Fragment for a single node, `None` when it has nothing responsive
    pub fn fragment_for(&self, node: &Node) -> Option<StyleFragment> {
        build_fragment(node, &self.resolver(), &self.config)
    }

    fn render_node(&self, node: &Node, ctx: &EvalContext) -> VNode {
        let resolver = self.resolver();
        let breakpoint = ctx.style_breakpoint();

        let mut element = VNode::element(self.tag_for(node, &resolver))
            .with_node_id(node.id.clone())
            .with_attr("class", self.class_list(node, &resolver));

        for (property, value) in inline_declarations(node, breakpoint, &resolver, &self.config) {
            element = element.with_style(property, value);
        }

        if let Some(css_id) = advanced_text(node, "cssId", &resolver) {
            element = element.with_attr("id", css_id);
        }
        if let Some(widget_type) = &node.widget_type {
            element = element.with_attr("data-widget-type", widget_type.clone());
        }

        if ctx.mode == RenderMode::Editor {
            element = element.with_attr("data-node-id", node.id.clone());
            if ctx.selected.as_deref() == Some(node.id.as_str()) {
                element = element.with_attr("data-selected", "true");
            }
            if is_hidden_at(node, ctx.breakpoint, &resolver) {
                element = element.with_attr("data-hidden", "true");
            }
        }

        if node.kind == NodeKind::Widget {
            let widget_ctx = WidgetContext::new(node, resolver);
            element.with_children(self.widgets.render(&widget_ctx))
        } else {
            let children = node.children.iter().map(|c| self.render_node(c, ctx)).collect();
            element.with_children(children)
        }
    }

    fn tag_for(&self, node: &Node, resolver: &CascadeResolver<'_>) -> String {
        let default = match node.kind {
            NodeKind::Section => "section",
            NodeKind::Root | NodeKind::Column | NodeKind::Widget => "div",
        };
        if node.kind == NodeKind::Widget {
            return default.to_string();
        }
        advanced_text(node, "htmlTag", resolver)
            .filter(|tag| CONTAINER_TAGS.contains(&tag.as_str()))
            .unwrap_or_else(|| default.to_string())
    }

    fn class_list(&self, node: &Node, resolver: &CascadeResolver<'_>) -> String {
        let mut classes = vec![format!("pb-{}", node.kind)];
        if let Some(widget_type) = &node.widget_type {
            classes.push(format!("pb-widget-{}", widget_type));
        }
        classes.push(compute_class_name(&node.id, &self.config));
        if let Some(custom) = advanced_text(node, "customClass", resolver) {
            classes.extend(custom.split_whitespace().map(str::to_string));
        }
        classes.join(" ")
    }
}

fn advanced_text(node: &Node, field: &str, resolver: &CascadeResolver<'_>) -> Option<String> {
    match resolver.resolve_value(node, field, Breakpoint::Desktop, Bucket::Advanced)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::set_override;
    use serde_json::json;

    fn page() -> Node {
        let heading = Node::widget("h", "heading")
            .with_prop("content", "Hi")
            .with_style("fontSize", "40px");
        let heading = set_override(&heading, "fontSize", Breakpoint::Tablet, Bucket::Style, json!("32px"));

        Node::new("root", NodeKind::Root).with_child(
            Node::new("s", NodeKind::Section)
                .with_style("background", "#eee")
                .with_style("padding", json!({"top": 20}))
                .with_child(Node::new("c", NodeKind::Column).with_child(heading)),
        )
    }

    #[test]
    fn test_live_render_uses_desktop_inline_styles() {
        let doc = Evaluator::new().evaluate(&page(), &EvalContext { breakpoint: Breakpoint::Mobile, ..EvalContext::live() });
        let heading = doc.find_by_node_id("h").unwrap();
        assert_eq!(heading.style("font-size"), Some("40px"));
        assert!(heading.has_class("node-h"));
        assert!(heading.has_class("pb-widget-heading"));
        assert_eq!(heading.attr("data-node-id"), None);
        assert_eq!(doc.fragments.len(), 1);
        assert_eq!(doc.fragments[0].element_id, "responsive-styles-h");
    }

    #[test]
    fn test_editor_render_resolves_previewed_device() {
        let ctx = EvalContext::editor(Breakpoint::Tablet).with_selected("h");
        let doc = Evaluator::new().evaluate(&page(), &ctx);
        let heading = doc.find_by_node_id("h").unwrap();
        assert_eq!(heading.style("font-size"), Some("32px"));
        assert_eq!(heading.attr("data-node-id"), Some("h"));
        assert_eq!(heading.attr("data-selected"), Some("true"));

        let mobile = Evaluator::new().evaluate(&page(), &EvalContext::editor(Breakpoint::Mobile));
        assert_eq!(mobile.find_by_node_id("h").unwrap().style("font-size"), Some("40px"));
    }

    #[test]
    fn test_container_styles_do_not_leak() {
        let doc = Evaluator::new().evaluate(&page(), &EvalContext::live());
        let section = doc.find_by_node_id("s").unwrap();
        assert_eq!(section.tag(), Some("section"));
        assert_eq!(section.style("background"), Some("#eee"));
        assert_eq!(section.style("padding-top"), Some("20px"));

        let column = doc.find_by_node_id("c").unwrap();
        assert_eq!(column.style("background"), None);
        assert_eq!(column.style("padding-top"), None);
        assert_eq!(column.style("flex-direction"), Some("column"));
    }

    #[test]
    fn test_custom_class_css_id_and_tag() {
        let root = Node::new("root", NodeKind::Root).with_child(
            Node::new("s", NodeKind::Section)
                .with_advanced("customClass", "hero dark")
                .with_advanced("cssId", "top")
                .with_advanced("htmlTag", "header"),
        );
        let doc = Evaluator::new().evaluate(&root, &EvalContext::live());
        let section = doc.find_by_node_id("s").unwrap();
        assert_eq!(section.tag(), Some("header"));
        assert!(section.has_class("hero") && section.has_class("dark"));
        assert_eq!(section.attr("id"), Some("top"));
        assert_eq!(section.style("custom-class"), None);
    }

    #[test]
    fn test_schema_defaults_render() {
        let evaluator = Evaluator::new().with_schema(Arc::new(SchemaRegistry::builtin()));
        let root = Node::new("root", NodeKind::Root).with_child(
            Node::new("s", NodeKind::Section)
                .with_child(Node::new("c", NodeKind::Column).with_child(Node::widget("b", "button"))),
        );
        let doc = evaluator.evaluate(&root, &EvalContext::live());
        assert_eq!(doc.find_by_node_id("b").unwrap().text_content(), "Click here");
        assert!(doc.fragments.is_empty());
    }

    #[test]
    fn test_parse_page_accepts_wrapped_and_bare() {
        let bare = r#"{"id":"r","kind":"root"}"#;
        let wrapped = r#"{"tree":{"id":"r","kind":"root","children":[]}}"#;
        assert_eq!(parse_page(bare).unwrap().id, "r");
        assert_eq!(parse_page(wrapped).unwrap().id, "r");
        assert!(matches!(
            parse_page(r#"{"id":"s","kind":"section"}"#),
            Err(RenderError::NotRoot { found: NodeKind::Section })
        ));
        assert!(matches!(parse_page("{"), Err(RenderError::InvalidDocument(_))));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = Evaluator::new();
        let a = evaluator.evaluate(&page(), &EvalContext::live());
        let b = evaluator.evaluate(&page(), &EvalContext::live());
        assert_eq!(a, b);
    }
}
