//! # Responsive Cascade
//!
//! Resolves the effective value of a style/advanced field for a breakpoint:
//!
//! ```text
//! desktop  → node.{bucket}[field]
//! tablet   → responsive.tablet.{bucket}[field]  ?? desktop
//! mobile   → responsive.mobile.{bucket}[field]  ?? desktop
//! ```
//!
//! Mobile falls back straight to desktop; a tablet override never leaks
//! into mobile. When neither tier has a value, the schema default (if any)
//! is used.
//!
//! Fields the schema declares `responsive: false` never resolve through
//! the override tier, even when stored data carries an override for them.

use pagebuilder_model::{Breakpoint, Bucket, BucketOverrides, Field, FieldMap, Node, SchemaRegistry};
use serde_json::Value;
use tracing::warn;

/// Effective value ignoring schema defaults and responsive flags
pub fn resolve_value<'n>(
    node: &'n Node,
    field: &str,
    breakpoint: Breakpoint,
    bucket: Bucket,
) -> Option<&'n Value> {
    if !breakpoint.is_desktop() {
        if let Some(value) = node.overrides(breakpoint, bucket).and_then(|o| o.get(field)) {
            return Some(value);
        }
    }
    node.bucket(bucket).get(field)
}

/// True iff an override exists for exactly this breakpoint/bucket/field
pub fn is_overridden(node: &Node, field: &str, breakpoint: Breakpoint, bucket: Bucket) -> bool {
    node.overrides(breakpoint, bucket)
        .map_or(false, |o| o.contains_key(field))
}

/// Write `value` for `field` at `breakpoint`. Desktop writes the baseline.
pub fn set_override(
    node: &Node,
    field: &str,
    breakpoint: Breakpoint,
    bucket: Bucket,
    value: Value,
) -> Node {
    let mut next = node.clone();
    match next.responsive.slot_mut(breakpoint) {
        None => {
            next.bucket_mut(bucket).insert(field.to_string(), value);
        }
        Some(slot) => {
            slot.get_or_insert_with(BucketOverrides::default)
                .bucket_mut(bucket)
                .insert(field.to_string(), value);
        }
    }
    next
}

/// Remove a single override. A breakpoint left without any override field
/// is pruned. Clearing an absent override returns an equal node.
///
/// For desktop this removes the baseline value itself.
pub fn clear_override(node: &Node, field: &str, breakpoint: Breakpoint, bucket: Bucket) -> Node {
    let mut next = node.clone();
    match next.responsive.slot_mut(breakpoint) {
        None => {
            next.bucket_mut(bucket).remove(field);
        }
        Some(slot) => {
            let removed = slot
                .as_mut()
                .map_or(false, |o| o.bucket_mut(bucket).remove(field).is_some());
            if removed && slot.as_ref().map_or(false, BucketOverrides::is_empty) {
                *slot = None;
            }
        }
    }
    next
}

/// Schema-aware resolver used by rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeResolver<'a> {
    schema: Option<&'a SchemaRegistry>,
}

impl<'a> CascadeResolver<'a> {
    pub fn new(schema: Option<&'a SchemaRegistry>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> Option<&'a SchemaRegistry> {
        self.schema
    }

    /// False only when the schema explicitly declares the field non-responsive
    pub fn override_allowed(&self, node: &Node, field: &str, bucket: Bucket) -> bool {
        self.schema
            .and_then(|schema| schema.field(node, bucket, field))
            .map_or(true, |def| def.responsive)
    }

    pub fn resolve_value(
        &self,
        node: &Node,
        field: &str,
        breakpoint: Breakpoint,
        bucket: Bucket,
    ) -> Option<Value> {
        if !breakpoint.is_desktop() {
            if let Some(value) = node.overrides(breakpoint, bucket).and_then(|o| o.get(field)) {
                if self.override_allowed(node, field, bucket) {
                    return Some(value.clone());
                }
                warn!(
                    node_id = %node.id,
                    field,
                    %breakpoint,
                    %bucket,
                    "Ignoring override for non-responsive field"
                );
            }
        }

        if let Some(value) = node.bucket(bucket).get(field) {
            return Some(value.clone());
        }

        self.schema
            .and_then(|schema| schema.field(node, bucket, field))
            .and_then(|def| def.default.clone())
    }

    /// Overrides for a breakpoint bucket that the schema permits
    pub fn effective_overrides(&self, node: &Node, breakpoint: Breakpoint, bucket: Bucket) -> FieldMap {
        let Some(overrides) = node.overrides(breakpoint, bucket) else {
            return FieldMap::new();
        };

        overrides
            .iter()
            .filter(|(field, _)| {
                let allowed = self.override_allowed(node, field, bucket);
                if !allowed {
                    warn!(
                        node_id = %node.id,
                        field = field.as_str(),
                        %breakpoint,
                        "Ignoring override for non-responsive field"
                    );
                }
                allowed
            })
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    /// Every field of a bucket resolved for `breakpoint`, schema defaults included
    pub fn resolve_bucket(&self, node: &Node, breakpoint: Breakpoint, bucket: Bucket) -> FieldMap {
        let mut resolved = FieldMap::new();

        if let Some(schema) = self.schema.and_then(|s| s.schema_for(node)) {
            for field in schema.fields(bucket) {
                if let Some(default) = &field.default {
                    resolved.insert(field.name.clone(), default.clone());
                }
            }
        }

        for (field, value) in node.bucket(bucket) {
            resolved.insert(field.clone(), value.clone());
        }

        if !breakpoint.is_desktop() {
            resolved.extend(self.effective_overrides(node, breakpoint, bucket));
        }

        resolved
    }

    /// Declared content field of the node's schema
    pub fn content_field(&self, node: &Node, name: &str) -> Option<&'a Field> {
        self.schema
            .and_then(|schema| schema.schema_for(node))
            .and_then(|schema| schema.content.iter().find(|f| f.name == name))
    }

    /// Content prop with the schema default as fallback
    pub fn resolve_prop(&self, node: &Node, name: &str) -> Option<Value> {
        if let Some(value) = node.props.get(name) {
            return Some(value.clone());
        }
        self.content_field(node, name).and_then(|def| def.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebuilder_model::NodeKind;
    use serde_json::json;

    fn heading() -> Node {
        let node = Node::widget("h1", "heading").with_style("fontSize", "40px");
        set_override(&node, "fontSize", Breakpoint::Tablet, Bucket::Style, json!("32px"))
    }

    #[test]
    fn test_mobile_falls_back_to_desktop_not_tablet() {
        let node = heading();
        let get = |bp| resolve_value(&node, "fontSize", bp, Bucket::Style).cloned();
        assert_eq!(get(Breakpoint::Desktop), Some(json!("40px")));
        assert_eq!(get(Breakpoint::Tablet), Some(json!("32px")));
        assert_eq!(get(Breakpoint::Mobile), Some(json!("40px")));
    }

    #[test]
    fn test_desktop_ignores_overrides() {
        let node = set_override(
            &Node::new("c", NodeKind::Column),
            "gap",
            Breakpoint::Mobile,
            Bucket::Advanced,
            json!(4),
        );
        assert_eq!(resolve_value(&node, "gap", Breakpoint::Desktop, Bucket::Advanced), None);
        assert_eq!(
            resolve_value(&node, "gap", Breakpoint::Mobile, Bucket::Advanced),
            Some(&json!(4))
        );
    }

    #[test]
    fn test_set_override_marks_only_that_breakpoint() {
        let node = set_override(
            &Node::widget("t", "text"),
            "fontSize",
            Breakpoint::Mobile,
            Bucket::Style,
            json!("14px"),
        );
        assert!(is_overridden(&node, "fontSize", Breakpoint::Mobile, Bucket::Style));
        assert!(!is_overridden(&node, "fontSize", Breakpoint::Tablet, Bucket::Style));
        assert!(!is_overridden(&node, "fontSize", Breakpoint::Mobile, Bucket::Advanced));
    }

    #[test]
    fn test_set_override_on_desktop_writes_baseline() {
        let node = set_override(
            &Node::widget("t", "text"),
            "color",
            Breakpoint::Desktop,
            Bucket::Style,
            json!("red"),
        );
        assert_eq!(node.style["color"], json!("red"));
        assert!(node.responsive.is_empty());
        assert!(!is_overridden(&node, "color", Breakpoint::Desktop, Bucket::Style));
    }

    #[test]
    fn test_clear_override_is_idempotent() {
        let node = heading();
        let once = clear_override(&node, "fontSize", Breakpoint::Tablet, Bucket::Style);
        let twice = clear_override(&once, "fontSize", Breakpoint::Tablet, Bucket::Style);
        assert_eq!(once, twice);
        assert!(once.responsive.tablet.is_none(), "empty breakpoint is pruned");
        assert_eq!(once.style["fontSize"], json!("40px"));
    }

    #[test]
    fn test_clear_override_leaves_other_overrides() {
        let node = set_override(&heading(), "color", Breakpoint::Tablet, Bucket::Style, json!("blue"));
        let node = set_override(&node, "gap", Breakpoint::Tablet, Bucket::Advanced, json!(8));
        let cleared = clear_override(&node, "fontSize", Breakpoint::Tablet, Bucket::Style);
        assert!(is_overridden(&cleared, "color", Breakpoint::Tablet, Bucket::Style));
        assert!(is_overridden(&cleared, "gap", Breakpoint::Tablet, Bucket::Advanced));
        assert!(!is_overridden(&cleared, "fontSize", Breakpoint::Tablet, Bucket::Style));
    }

    #[test]
    fn test_clear_absent_override_keeps_empty_entry() {
        let mut node = Node::widget("t", "text");
        node.responsive.mobile = Some(BucketOverrides::default());
        let cleared = clear_override(&node, "color", Breakpoint::Mobile, Bucket::Style);
        assert_eq!(cleared, node);
    }

    #[test]
    fn test_resolver_ignores_non_responsive_override() {
        let schema = SchemaRegistry::builtin();
        let resolver = CascadeResolver::new(Some(&schema));
        let node = set_override(
            &Node::widget("h", "heading").with_style("fontWeight", 400),
            "fontWeight",
            Breakpoint::Mobile,
            Bucket::Style,
            json!(900),
        );
        assert_eq!(
            resolver.resolve_value(&node, "fontWeight", Breakpoint::Mobile, Bucket::Style),
            Some(json!(400))
        );
        assert!(resolver
            .effective_overrides(&node, Breakpoint::Mobile, Bucket::Style)
            .is_empty());
    }

    #[test]
    fn test_resolver_uses_schema_default_last() {
        let schema = SchemaRegistry::builtin();
        let resolver = CascadeResolver::new(Some(&schema));
        let node = Node::new("s", NodeKind::Section);
        assert_eq!(
            resolver.resolve_value(&node, "hideOnMobile", Breakpoint::Mobile, Bucket::Advanced),
            Some(json!(false))
        );
        assert_eq!(
            resolver.resolve_value(&node, "nothing", Breakpoint::Mobile, Bucket::Advanced),
            None
        );
    }

    #[test]
    fn test_resolver_keeps_overrides_for_undeclared_fields() {
        let resolver = CascadeResolver::new(None);
        let node = set_override(
            &Node::widget("x", "countdown"),
            "letterSpacing",
            Breakpoint::Tablet,
            Bucket::Style,
            json!("2px"),
        );
        assert_eq!(
            resolver.resolve_value(&node, "letterSpacing", Breakpoint::Tablet, Bucket::Style),
            Some(json!("2px"))
        );
    }

    #[test]
    fn test_resolve_bucket_merges_tiers() {
        let resolver = CascadeResolver::new(None);
        let node = set_override(&heading(), "color", Breakpoint::Mobile, Bucket::Style, json!("red"))
            .with_style("lineHeight", 1.2);
        let mobile = resolver.resolve_bucket(&node, Breakpoint::Mobile, Bucket::Style);
        assert_eq!(mobile["fontSize"], json!("40px"));
        assert_eq!(mobile["color"], json!("red"));
        assert_eq!(mobile["lineHeight"], json!(1.2));

        let tablet = resolver.resolve_bucket(&node, Breakpoint::Tablet, Bucket::Style);
        assert_eq!(tablet["fontSize"], json!("32px"));
        assert!(!tablet.contains_key("color"));
    }

    #[test]
    fn test_resolve_prop_default() {
        let schema = SchemaRegistry::builtin();
        let resolver = CascadeResolver::new(Some(&schema));
        let node = Node::widget("b", "button");
        assert_eq!(resolver.resolve_prop(&node, "text"), Some(json!("Click here")));
        let node = node.with_prop("text", "Buy");
        assert_eq!(resolver.resolve_prop(&node, "text"), Some(json!("Buy")));
    }
}
