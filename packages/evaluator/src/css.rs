//! # CSS Generation
//!
//! Turns resolved field maps into CSS declarations and synthesizes the
//! per-node responsive stylesheet fragment.
//!
//! Desktop values are applied inline on the element. Inline styles cannot
//! carry `@media` conditions, so tablet/mobile overrides are emitted as a
//! stylesheet fragment scoped to the node's class:
//!
//! ```css
//! @media (max-width: 768px) {
//!   .node-abc {
//!     font-size: 32px !important;
//!   }
//! }
//! ```
//!
//! Structured values are always expanded to longhands (`padding-top`,
//! `border-width`, ...). Emitting shorthands would let a responsive
//! `padding` silently reset sides that desktop set individually.

use crate::cascade::CascadeResolver;
use crate::config::RenderConfig;
use crate::units::{coerce_scalar, parse_dimension};
use crate::utils::{compute_class_name, fragment_element_id};
use pagebuilder_model::{
    Breakpoint, Bucket, FieldCategory, FieldMap, Node, NodeKind, Scalar, StyleValue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Advanced fields that configure the element rather than its CSS
const NON_CSS_ADVANCED_FIELDS: &[&str] = &[
    "customClass",
    "cssId",
    "htmlTag",
    "hideOnDesktop",
    "hideOnTablet",
    "hideOnMobile",
];

/// Characters that would let a value break out of its declaration or rule
const UNSAFE_VALUE_CHARS: &[char] = &['{', '}', ';', '<', '\\'];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssDeclaration {
    pub property: String,
    pub value: String,
    #[serde(default)]
    pub important: bool,
}

/// CSS rule with selector, ordered declarations and optional media query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<CssDeclaration>,
    pub media_query: Option<String>,
}

impl CssRule {
    pub fn new(selector: impl Into<String>, media_query: Option<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: Vec::new(),
            media_query,
        }
    }

    /// Add a declaration, replacing any earlier one for the same property
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>, important: bool) {
        let property = property.into();
        let value = value.into();
        if let Some(existing) = self.declarations.iter_mut().find(|d| d.property == property) {
            existing.value = value;
            existing.important = important;
        } else {
            self.declarations.push(CssDeclaration {
                property,
                value,
                important,
            });
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn to_css(&self) -> String {
        let indent = if self.media_query.is_some() { "  " } else { "" };
        let mut css = String::new();

        if let Some(query) = &self.media_query {
            css.push_str(query);
            css.push_str(" {\n");
        }

        css.push_str(indent);
        css.push_str(&self.selector);
        css.push_str(" {\n");

        for decl in &self.declarations {
            css.push_str(indent);
            css.push_str("  ");
            css.push_str(&decl.property);
            css.push_str(": ");
            css.push_str(&decl.value);
            if decl.important {
                css.push_str(" !important");
            }
            css.push_str(";\n");
        }

        css.push_str(indent);
        css.push_str("}\n");

        if self.media_query.is_some() {
            css.push_str("}\n");
        }

        css
    }
}

pub fn rules_to_css(rules: &[CssRule]) -> String {
    rules
        .iter()
        .map(CssRule::to_css)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `fontSize` → `font-size`
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

/// CSS property a field renders to, `None` for fields that are not CSS
pub fn css_property(bucket: Bucket, field: &str) -> Option<String> {
    let property = match (bucket, field) {
        (Bucket::Advanced, f) if NON_CSS_ADVANCED_FIELDS.contains(&f) => return None,
        (Bucket::Advanced, "direction") => "flex-direction",
        (Bucket::Advanced, "justify") => "justify-content",
        (Bucket::Advanced, "align") => "align-items",
        (Bucket::Advanced, "wrap") => "flex-wrap",
        (Bucket::Style, "align") => "text-align",
        (_, "shadow") => "box-shadow",
        (_, f) => return Some(to_kebab_case(f)),
    };
    Some(property.to_string())
}

/// Initial declarations every container starts from before its own fields
pub fn container_defaults(kind: NodeKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        NodeKind::Section => &[("display", "flex"), ("flex-direction", "row")],
        NodeKind::Column => &[
            ("display", "flex"),
            ("flex-direction", "column"),
            ("flex", "1 1 0"),
        ],
        NodeKind::Root | NodeKind::Widget => &[],
    }
}

/// Whether a generated declaration stays inside its rule
pub fn is_safe_declaration(property: &str, value: &str) -> bool {
    !property.is_empty()
        && property.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !value.contains(UNSAFE_VALUE_CHARS)
}

/// Expand one field into longhand `(property, value)` pairs.
///
/// Declarations whose property or value could escape the node's rule are
/// dropped and reported.
pub fn expand_field(bucket: Bucket, field: &str, value: &Value, default_unit: &str) -> Vec<(String, String)> {
    expand_field_unchecked(bucket, field, value, default_unit)
        .into_iter()
        .filter(|(property, css_value)| {
            let safe = is_safe_declaration(property, css_value);
            if !safe {
                warn!(field, property = %property, value = %css_value, "Dropping unsafe style value");
            }
            safe
        })
        .collect()
}

fn expand_field_unchecked(bucket: Bucket, field: &str, value: &Value, default_unit: &str) -> Vec<(String, String)> {
    let Some(property) = css_property(bucket, field) else {
        return Vec::new();
    };
    let Some(style_value) = StyleValue::classify(field, value) else {
        return Vec::new();
    };

    let length = |prop: &str, scalar: &Scalar| coerce_scalar(prop, scalar, default_unit);

    match style_value {
        StyleValue::Scalar(scalar) => match (FieldCategory::of(field), &scalar) {
            (FieldCategory::BoxEdges, Scalar::Text(text)) => {
                expand_box_shorthand(&property, text, default_unit)
            }
            (FieldCategory::Border, Scalar::Text(text)) => expand_border_shorthand(text, default_unit),
            (FieldCategory::BoxEdges, Scalar::Number(_)) => ["top", "right", "bottom", "left"]
                .iter()
                .map(|edge| {
                    let prop = format!("{}-{}", property, edge);
                    let value = length(&prop, &scalar);
                    (prop, value)
                })
                .collect(),
            _ => {
                let value = length(&property, &scalar);
                vec![(property, value)]
            }
        },

        StyleValue::Border(border) => {
            let mut out = Vec::new();
            if let Some(width) = &border.width {
                out.push(("border-width".to_string(), length("border-width", width)));
            }
            if let Some(style) = &border.style {
                out.push(("border-style".to_string(), style.clone()));
            }
            if let Some(color) = &border.color {
                out.push(("border-color".to_string(), color.clone()));
            }
            if let Some(radius) = &border.radius {
                out.push(("border-radius".to_string(), length("border-radius", radius)));
            }
            out
        }

        StyleValue::Shadow(shadow) => {
            let zero = Scalar::Number(0.0);
            let mut parts = Vec::new();
            if shadow.inset {
                parts.push("inset".to_string());
            }
            parts.push(length("box-shadow", shadow.offset_x.as_ref().unwrap_or(&zero)));
            parts.push(length("box-shadow", shadow.offset_y.as_ref().unwrap_or(&zero)));
            if let Some(blur) = &shadow.blur {
                parts.push(length("box-shadow", blur));
            }
            if let Some(spread) = &shadow.spread {
                if shadow.blur.is_none() {
                    parts.push(length("box-shadow", &zero));
                }
                parts.push(length("box-shadow", spread));
            }
            if let Some(color) = &shadow.color {
                parts.push(color.clone());
            }
            vec![(property, parts.join(" "))]
        }

        StyleValue::BoxEdges(edges) => edges
            .edges()
            .into_iter()
            .filter_map(|(edge, scalar)| {
                let scalar = scalar?;
                let prop = format!("{}-{}", property, edge);
                let value = length(&prop, scalar);
                Some((prop, value))
            })
            .collect(),
    }
}

/// `"10px 20px"` → four `{property}-{edge}` longhands using the CSS 1–4 value rule
fn expand_box_shorthand(property: &str, text: &str, default_unit: &str) -> Vec<(String, String)> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let (top, right, bottom, left) = match parts.as_slice() {
        [all] => (*all, *all, *all, *all),
        [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
        [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
        [top, right, bottom, left] => (*top, *right, *bottom, *left),
        _ => return vec![(property.to_string(), text.to_string())],
    };

    [("top", top), ("right", right), ("bottom", bottom), ("left", left)]
        .iter()
        .map(|(edge, value)| {
            let prop = format!("{}-{}", property, edge);
            let value = coerce_scalar(&prop, &Scalar::Text(value.to_string()), default_unit);
            (prop, value)
        })
        .collect()
}

/// `"1px solid #ddd"` → width/style/color longhands
fn expand_border_shorthand(text: &str, default_unit: &str) -> Vec<(String, String)> {
    let mut width = None;
    let mut style = None;
    let mut color = Vec::new();

    for token in text.split_whitespace() {
        if width.is_none() && parse_dimension(token, default_unit).is_some() {
            width = Some(coerce_scalar(
                "border-width",
                &Scalar::Text(token.to_string()),
                default_unit,
            ));
        } else if style.is_none() && BORDER_STYLES.contains(&token) {
            style = Some(token.to_string());
        } else {
            color.push(token);
        }
    }

    let mut out = Vec::new();
    if let Some(width) = width {
        out.push(("border-width".to_string(), width));
    }
    if let Some(style) = style {
        out.push(("border-style".to_string(), style));
    }
    if !color.is_empty() {
        out.push(("border-color".to_string(), color.join(" ")));
    }
    out
}

/// Longhand declarations for a whole bucket; later fields win on collisions
pub fn expand_bucket(bucket: Bucket, fields: &FieldMap, default_unit: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for (field, value) in fields {
        for (property, css_value) in expand_field(bucket, field, value, default_unit) {
            upsert(&mut out, property, css_value);
        }
    }
    out
}

/// Final render-time merge of the two buckets: style first, then advanced
pub fn flatten_buckets(style: &FieldMap, advanced: &FieldMap, default_unit: &str) -> Vec<(String, String)> {
    let mut out = expand_bucket(Bucket::Style, style, default_unit);
    for (property, value) in expand_bucket(Bucket::Advanced, advanced, default_unit) {
        upsert(&mut out, property, value);
    }
    out
}

fn upsert(list: &mut Vec<(String, String)>, property: String, value: String) {
    if let Some(existing) = list.iter_mut().find(|(p, _)| *p == property) {
        existing.1 = value;
    } else {
        list.push((property, value));
    }
}

/// Inline declarations for a node at a breakpoint (container defaults included)
pub fn inline_declarations(
    node: &Node,
    breakpoint: Breakpoint,
    resolver: &CascadeResolver<'_>,
    config: &RenderConfig,
) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = container_defaults(node.kind)
        .iter()
        .map(|(p, v)| (p.to_string(), v.to_string()))
        .collect();

    let style = resolver.resolve_bucket(node, breakpoint, Bucket::Style);
    let advanced = resolver.resolve_bucket(node, breakpoint, Bucket::Advanced);
    for (property, value) in flatten_buckets(&style, &advanced, &config.default_unit) {
        upsert(&mut out, property, value);
    }
    out
}

fn is_truthy(value: Option<Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
        _ => false,
    }
}

/// Whether the node's visibility flag hides it at `breakpoint`
pub fn is_hidden_at(node: &Node, breakpoint: Breakpoint, resolver: &CascadeResolver<'_>) -> bool {
    let flag = match breakpoint {
        Breakpoint::Desktop => "hideOnDesktop",
        Breakpoint::Tablet => "hideOnTablet",
        Breakpoint::Mobile => "hideOnMobile",
    };
    is_truthy(resolver.resolve_value(node, flag, Breakpoint::Desktop, Bucket::Advanced))
}

/// Rules carrying a node's tablet/mobile overrides and visibility flags.
///
/// The tablet query (`max-width: 768px`) also matches mobile widths, so the
/// mobile rule re-asserts the desktop value of every property tablet
/// overrides and mobile does not. That keeps the live site consistent with
/// the cascade, where mobile falls back to desktop rather than tablet.
pub fn responsive_rules(node: &Node, resolver: &CascadeResolver<'_>, config: &RenderConfig) -> Vec<CssRule> {
    let selector = format!(".{}", compute_class_name(&node.id, config));
    let unit = config.default_unit.as_str();
    let mut rules = Vec::new();

    let overrides_for = |breakpoint: Breakpoint| {
        flatten_buckets(
            &resolver.effective_overrides(node, breakpoint, Bucket::Style),
            &resolver.effective_overrides(node, breakpoint, Bucket::Advanced),
            unit,
        )
    };
    let tablet = overrides_for(Breakpoint::Tablet);
    let mobile = overrides_for(Breakpoint::Mobile);

    if !tablet.is_empty() {
        let mut rule = CssRule::new(selector.clone(), config.media_query(Breakpoint::Tablet));
        for (property, value) in &tablet {
            rule.set(property.clone(), value.clone(), config.important);
        }
        rules.push(rule);
    }

    let mut mobile_rule = CssRule::new(selector.clone(), config.media_query(Breakpoint::Mobile));
    for (property, value) in &mobile {
        mobile_rule.set(property.clone(), value.clone(), config.important);
    }
    if !tablet.is_empty() {
        let desktop: BTreeMap<String, String> = inline_declarations(node, Breakpoint::Desktop, resolver, config)
            .into_iter()
            .collect();
        for (property, _) in &tablet {
            if mobile_rule.get(property).is_none() {
                let value = desktop.get(property).map_or("unset", String::as_str);
                mobile_rule.set(property.clone(), value, config.important);
            }
        }
    }
    if !mobile_rule.is_empty() {
        rules.push(mobile_rule);
    }

    for breakpoint in Breakpoint::ALL {
        if is_hidden_at(node, breakpoint, resolver) {
            let mut rule = CssRule::new(selector.clone(), Some(config.exclusive_media_query(breakpoint)));
            rule.set("display", "none", config.important);
            rules.push(rule);
        }
    }

    rules
}

/// Generated stylesheet text for one node, keyed for injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleFragment {
    pub node_id: String,
    /// Id of the `<style>` element this fragment is injected under
    pub element_id: String,
    pub class_name: String,
    pub rules: Vec<CssRule>,
    pub css: String,
}

pub fn build_fragment(node: &Node, resolver: &CascadeResolver<'_>, config: &RenderConfig) -> Option<StyleFragment> {
    let rules = responsive_rules(node, resolver, config);
    if rules.is_empty() {
        return None;
    }

    Some(StyleFragment {
        node_id: node.id.clone(),
        element_id: fragment_element_id(&node.id, config),
        class_name: compute_class_name(&node.id, config),
        css: rules_to_css(&rules),
        rules,
    })
}

/// Stylesheet text for a node's responsive overrides.
///
/// `None` when the node has no tablet/mobile overrides and no visibility
/// flag set. A `hideOn*` flag alone still yields a `display: none` block.
pub fn synthesize_responsive_css(node: &Node, config: &RenderConfig) -> Option<String> {
    build_fragment(node, &CascadeResolver::new(None), config).map(|fragment| fragment.css)
}
