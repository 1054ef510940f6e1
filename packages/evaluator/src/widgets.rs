//! Content renderers for leaf widgets.
//!
//! A renderer produces the children of the widget's wrapper element; the
//! evaluator owns the wrapper itself (classes, inline style, node id).

use crate::cascade::CascadeResolver;
use crate::vdom::VNode;
use pagebuilder_model::Node;
use serde_json::Value;
use std::collections::HashMap;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "div", "span"];

/// Ceiling on generated list items when no schema bounds the count
const MAX_GENERATED_ITEMS: u64 = 100;

/// What a renderer sees of the widget being rendered
pub struct WidgetContext<'a> {
    pub node: &'a Node,
    pub resolver: CascadeResolver<'a>,
}

impl<'a> WidgetContext<'a> {
    pub fn new(node: &'a Node, resolver: CascadeResolver<'a>) -> Self {
        Self { node, resolver }
    }

    pub fn prop(&self, name: &str) -> Option<Value> {
        self.resolver.resolve_prop(self.node, name)
    }

    /// Prop as display text; numbers are stringified, empty strings are absent
    pub fn prop_str(&self, name: &str) -> Option<String> {
        match self.prop(name)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Numeric prop, clamped to the range its schema field declares
    pub fn prop_number(&self, name: &str) -> Option<f64> {
        let value = match self.prop(name)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        if !value.is_finite() {
            return None;
        }
        Some(match self.resolver.content_field(self.node, name) {
            Some(field) => field.clamp(value),
            None => value,
        })
    }

    pub fn prop_bool(&self, name: &str) -> bool {
        matches!(self.prop(name), Some(Value::Bool(true)))
    }
}

pub type RenderFn = fn(&WidgetContext<'_>) -> Vec<VNode>;

/// Maps `widgetType` to its content renderer
#[derive(Clone)]
pub struct WidgetRegistry {
    renderers: HashMap<String, RenderFn>,
}

impl WidgetRegistry {
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("heading", render_heading);
        registry.register("text", render_text);
        registry.register("button", render_button);
        registry.register("image", render_image);
        registry.register("video", render_video);
        registry.register("divider", render_divider);
        registry.register("iconlist", render_icon_list);
        registry.register("icon", render_icon);
        registry
    }

    pub fn register(&mut self, widget_type: impl Into<String>, render: RenderFn) {
        self.renderers.insert(widget_type.into(), render);
    }

    pub fn is_registered(&self, widget_type: &str) -> bool {
        self.renderers.contains_key(widget_type)
    }

    /// Render a widget's content. Unknown types render no content.
    pub fn render(&self, ctx: &WidgetContext<'_>) -> Vec<VNode> {
        ctx.node
            .widget_type
            .as_deref()
            .and_then(|t| self.renderers.get(t))
            .map_or_else(Vec::new, |render| render(ctx))
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&String> = self.renderers.keys().collect();
        types.sort();
        f.debug_struct("WidgetRegistry").field("types", &types).finish()
    }
}

fn link_wrapped(ctx: &WidgetContext<'_>, child: VNode) -> VNode {
    match ctx.prop_str("link") {
        Some(href) => VNode::element("a").with_attr("href", href).with_child(child),
        None => child,
    }
}

fn render_heading(ctx: &WidgetContext<'_>) -> Vec<VNode> {
    let tag = ctx
        .prop_str("tag")
        .filter(|t| HEADING_TAGS.contains(&t.as_str()))
        .unwrap_or_else(|| "h2".to_string());
    let content = ctx.prop_str("content").unwrap_or_default();

    let heading = VNode::element(tag)
        .with_attr("class", "pb-heading-title")
        .with_child(VNode::text(content));
    vec![link_wrapped(ctx, heading)]
}

fn render_text(ctx: &WidgetContext<'_>) -> Vec<VNode> {
    let content = ctx.prop_str("content").unwrap_or_default();
    vec![VNode::element("div")
        .with_attr("class", "pb-text")
        .with_child(VNode::text(content))]
}

fn render_button(ctx: &WidgetContext<'_>) -> Vec<VNode> {
    let text = ctx.prop_str("text").unwrap_or_default();
    let href = ctx.prop_str("link").unwrap_or_else(|| "#".to_string());
    vec![VNode::element("a")
        .with_attr("class", "pb-button")
        .with_attr("href", href)
        .with_child(VNode::text(text))]
}

fn render_image(ctx: &WidgetContext<'_>) -> Vec<VNode> {
    let Some(src) = ctx.prop_str("src") else {
        return vec![VNode::element("div")
            .with_attr("class", "pb-placeholder")
            .with_child(VNode::text("No image selected"))];
    };

    let img = VNode::element("img")
        .with_attr("src", src)
        .with_attr("alt", ctx.prop_str("alt").unwrap_or_default())
        .with_style("max-width", "100%");
    vec![link_wrapped(ctx, img)]
}

/// Embed URL for YouTube/Vimeo links, `None` for anything else
pub fn embed_url(url: &str) -> Option<String> {
    let url = url.trim();
    let after_scheme = url.split("://").nth(1).unwrap_or(url);
    let after_scheme = after_scheme.strip_prefix("www.").unwrap_or(after_scheme);

    let id_from = |rest: &str| {
        rest.split(|c| c == '&' || c == '?' || c == '/' || c == '#')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    };

    if let Some(rest) = after_scheme.strip_prefix("youtube.com/watch?v=") {
        return id_from(rest).map(|id| format!("https://www.youtube.com/embed/{}", id));
    }
    if let Some(rest) = after_scheme.strip_prefix("youtu.be/") {
        return id_from(rest).map(|id| format!("https://www.youtube.com/embed/{}", id));
    }
    if let Some(rest) = after_scheme.strip_prefix("youtube.com/embed/") {
        return id_from(rest).map(|id| format!("https://www.youtube.com/embed/{}", id));
    }
    if let Some(rest) = after_scheme.strip_prefix("vimeo.com/") {
        return id_from(rest)
            .filter(|id| id.chars().all(|c| c.is_ascii_digit()))
            .map(|id| format!("https://player.vimeo.com/video/{}", id));
    }
    None
}

fn render_video(ctx: &WidgetContext<'_>) -> Vec<VNode> {
    let Some(url) = ctx.prop_str("url") else {
        return vec![VNode::element("div")
            .with_attr("class", "pb-placeholder")
            .with_child(VNode::text("No video selected"))];
    };
    let autoplay = ctx.prop_bool("autoplay");

    let player = match embed_url(&url) {
        Some(embed) => {
            let src = if autoplay {
                format!("{}?autoplay=1&mute=1", embed)
            } else {
                embed
            };
            VNode::element("iframe")
                .with_attr("src", src)
                .with_attr("frameborder", "0")
                .with_attr("allowfullscreen", "true")
        }
        None => {
            let video = VNode::element("video")
                .with_attr("src", url)
                .with_attr("controls", "true");
            if autoplay {
                video.with_attr("autoplay", "true").with_attr("muted", "true")
            } else {
                video
            }
        }
    };

    vec![player
        .with_style("width", "100%")
        .with_style("height", "100%")]
}

fn render_divider(_ctx: &WidgetContext<'_>) -> Vec<VNode> {
    vec![VNode::element("hr").with_attr("class", "pb-divider")]
}

fn render_icon(ctx: &WidgetContext<'_>) -> Vec<VNode> {
    let icon = ctx.prop_str("icon").unwrap_or_else(|| "fa fa-star".to_string());
    vec![link_wrapped(
        ctx,
        VNode::element("i")
            .with_attr("class", icon)
            .with_attr("aria-hidden", "true"),
    )]
}

fn render_icon_list(ctx: &WidgetContext<'_>) -> Vec<VNode> {
    let item = |icon: String, text: String| {
        VNode::element("li")
            .with_attr("class", "pb-icon-list-item")
            .with_child(
                VNode::element("i")
                    .with_attr("class", icon)
                    .with_attr("aria-hidden", "true"),
            )
            .with_child(
                VNode::element("span")
                    .with_attr("class", "pb-icon-list-text")
                    .with_child(VNode::text(text)),
            )
    };

    let items: Vec<VNode> = match ctx.prop("items") {
        Some(Value::Array(entries)) if !entries.is_empty() => entries
            .iter()
            .map(|entry| {
                let field = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
                item(
                    field("icon").unwrap_or_else(|| "fa fa-check".to_string()),
                    field("text").unwrap_or_default(),
                )
            })
            .collect(),
        _ => {
            let count = ctx
                .prop_number("itemCount")
                .map_or(3, |n| n.max(0.0) as u64)
                .min(MAX_GENERATED_ITEMS);
            (1..=count)
                .map(|n| item("fa fa-check".to_string(), format!("List item {}", n)))
                .collect()
        }
    };

    vec![VNode::element("ul")
        .with_attr("class", "pb-icon-list")
        .with_children(items)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebuilder_model::SchemaRegistry;
    use serde_json::json;

    fn render(node: &Node) -> Vec<VNode> {
        let schema = SchemaRegistry::builtin();
        let ctx = WidgetContext::new(node, CascadeResolver::new(Some(&schema)));
        WidgetRegistry::builtin().render(&ctx)
    }

    #[test]
    fn test_heading_defaults_and_tag() {
        let out = render(&Node::widget("h", "heading"));
        assert_eq!(out[0].tag(), Some("h2"));
        assert_eq!(out[0].text_content(), "Heading");

        let out = render(&Node::widget("h", "heading").with_prop("tag", "h1").with_prop("content", "Hi"));
        assert_eq!(out[0].tag(), Some("h1"));
        assert_eq!(out[0].text_content(), "Hi");

        let out = render(&Node::widget("h", "heading").with_prop("tag", "script"));
        assert_eq!(out[0].tag(), Some("h2"));
    }

    #[test]
    fn test_button_uses_link() {
        let out = render(&Node::widget("b", "button").with_prop("link", "/shop"));
        assert_eq!(out[0].tag(), Some("a"));
        assert_eq!(out[0].attr("href"), Some("/shop"));
        assert_eq!(out[0].text_content(), "Click here");
    }

    #[test]
    fn test_image_placeholder_without_src() {
        let out = render(&Node::widget("i", "image"));
        assert!(out[0].has_class("pb-placeholder"));

        let out = render(&Node::widget("i", "image").with_prop("src", "/a.png").with_prop("alt", "A"));
        assert_eq!(out[0].tag(), Some("img"));
        assert_eq!(out[0].attr("alt"), Some("A"));
    }

    #[test]
    fn test_embed_urls() {
        assert_eq!(
            embed_url("https://www.youtube.com/watch?v=abc123&t=4").as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
        assert_eq!(
            embed_url("https://youtu.be/xyz").as_deref(),
            Some("https://www.youtube.com/embed/xyz")
        );
        assert_eq!(
            embed_url("https://vimeo.com/76979871").as_deref(),
            Some("https://player.vimeo.com/video/76979871")
        );
        assert_eq!(embed_url("https://cdn.example.com/clip.mp4"), None);
    }

    #[test]
    fn test_video_file_falls_back_to_video_tag() {
        let out = render(&Node::widget("v", "video").with_prop("url", "/clip.mp4"));
        assert_eq!(out[0].tag(), Some("video"));
        assert_eq!(out[0].attr("autoplay"), None);
    }

    #[test]
    fn test_icon_list_placeholders_follow_item_count() {
        let out = render(&Node::widget("l", "iconlist").with_prop("itemCount", 2));
        assert_eq!(out[0].children().len(), 2);
        assert_eq!(out[0].children()[1].text_content(), "List item 2");

        let out = render(
            &Node::widget("l", "iconlist")
                .with_prop("items", json!([{"icon": "fa fa-truck", "text": "Free shipping"}])),
        );
        assert_eq!(out[0].children().len(), 1);
        assert_eq!(out[0].text_content(), "Free shipping");
    }

    #[test]
    fn test_icon_list_item_count_is_bounded() {
        let huge = Node::widget("l", "iconlist").with_prop("itemCount", 200000);
        assert_eq!(render(&huge)[0].children().len(), 50);

        let none = Node::widget("l", "iconlist").with_prop("itemCount", -4);
        assert_eq!(render(&none)[0].children().len(), 1);

        // without a schema only the hard ceiling applies
        let ctx = WidgetContext::new(&huge, CascadeResolver::new(None));
        let out = WidgetRegistry::builtin().render(&ctx);
        assert_eq!(out[0].children().len(), MAX_GENERATED_ITEMS as usize);
    }

    #[test]
    fn test_prop_number_reads_numeric_strings() {
        let node = Node::widget("l", "iconlist").with_prop("itemCount", " 7 ");
        let ctx = WidgetContext::new(&node, CascadeResolver::new(None));
        assert_eq!(ctx.prop_number("itemCount"), Some(7.0));
        assert_eq!(ctx.prop_number("missing"), None);
    }

    #[test]
    fn test_unknown_widget_renders_nothing() {
        assert!(render(&Node::widget("x", "countdown")).is_empty());
    }
}
