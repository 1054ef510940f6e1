use pagebuilder_evaluator::{
    apply_fragment_patches, clear_override, set_override, synthesize_responsive_css, EvalContext,
    Evaluator, FragmentPatch, RenderConfig, StyleRegistry,
};
use pagebuilder_model::{
    delete_node, find_node, make_column, make_root, make_section, make_widget, insert, Breakpoint,
    Bucket, FieldMap, IdGenerator, Node, NodeKind, SchemaRegistry,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn content(text: &str) -> FieldMap {
    [("content".to_string(), json!(text))].into()
}

/// root > section > column > [heading, text]
fn build_page() -> (Node, String, String) {
    let mut ids = IdGenerator::from_seed("test");
    let root = make_root(&mut ids);
    let section = make_section(&mut ids);
    let column = make_column(&mut ids);
    let heading = make_widget(&mut ids, "heading", content("Welcome"));
    let text = make_widget(&mut ids, "text", content("Body"));
    let (root_id, section_id, column_id) = (root.id.clone(), section.id.clone(), column.id.clone());
    let (heading_id, text_id) = (heading.id.clone(), text.id.clone());

    let root = insert(&root, &root_id, section, None);
    let root = insert(&root, &section_id, column, None);
    let root = insert(&root, &column_id, heading, None);
    let root = insert(&root, &column_id, text, None);
    (root, heading_id, text_id)
}

fn edit(root: &Node, id: &str, f: impl FnOnce(&Node) -> Node) -> Node {
    pagebuilder_model::update_node(root, id, f)
}

#[test]
fn test_padding_override_longhands() {
    let node = Node::widget("w", "text");
    let node = set_override(
        &node,
        "padding",
        Breakpoint::Tablet,
        Bucket::Style,
        json!({"top": 10, "right": 10, "bottom": 10, "left": 10}),
    );

    let css = synthesize_responsive_css(&node, &RenderConfig::default()).unwrap();
    assert!(css.contains("@media (max-width: 768px)"));
    assert!(css.contains("padding-top: 10px !important;"));
    assert!(css.contains("padding-right: 10px !important;"));
    assert!(css.contains("padding-bottom: 10px !important;"));
    assert!(css.contains("padding-left: 10px !important;"));
    assert!(!css.contains("padding:"));
}

#[test]
fn test_registry_follows_edits_and_deletes() {
    let (root, heading_id, text_id) = build_page();
    let evaluator = Evaluator::new();
    let mut registry = StyleRegistry::new();
    let mut host: BTreeMap<String, String> = BTreeMap::new();

    // nothing responsive yet
    let patches = registry.sync(&evaluator.evaluate(&root, &EvalContext::live()).fragments);
    assert!(patches.is_empty());

    let root = edit(&root, &heading_id, |n| {
        set_override(n, "fontSize", Breakpoint::Mobile, Bucket::Style, json!("20px"))
    });
    let root = edit(&root, &text_id, |n| {
        set_override(n, "color", Breakpoint::Tablet, Bucket::Style, json!("#333"))
    });
    apply_fragment_patches(&mut host, &registry.sync(&evaluator.fragments(&root)));
    assert_eq!(host.len(), 2);

    // re-rendering many times never accumulates rules
    for _ in 0..5 {
        let patches = registry.sync(&evaluator.fragments(&root));
        assert!(patches.is_empty());
    }

    let root = edit(&root, &heading_id, |n| {
        set_override(n, "fontSize", Breakpoint::Mobile, Bucket::Style, json!("18px"))
    });
    let patches = registry.sync(&evaluator.fragments(&root));
    assert!(matches!(patches.as_slice(), [FragmentPatch::Replace { .. }]));
    apply_fragment_patches(&mut host, &patches);
    assert!(host[&format!("responsive-styles-{}", heading_id)].contains("18px"));

    let root = delete_node(&root, &text_id);
    apply_fragment_patches(&mut host, &registry.sync(&evaluator.fragments(&root)));
    assert_eq!(host.len(), 1);
    assert!(registry.get(&text_id).is_none());

    // clearing the last override releases the fragment too
    let root = edit(&root, &heading_id, |n| {
        clear_override(n, "fontSize", Breakpoint::Mobile, Bucket::Style)
    });
    apply_fragment_patches(&mut host, &registry.sync(&evaluator.fragments(&root)));
    assert!(host.is_empty());
    assert!(find_node(&root, &heading_id).is_some());
}

#[test]
fn test_live_page_render() {
    let (root, heading_id, _) = build_page();
    let evaluator = Evaluator::new().with_schema(Arc::new(SchemaRegistry::builtin()));
    let doc = evaluator.evaluate(&root, &EvalContext::live());

    let top = &doc.nodes[0];
    assert_eq!(top.attr("class"), Some(format!("pb-root node-{}", root.id).as_str()));

    let heading = doc.find_by_node_id(&heading_id).unwrap();
    assert_eq!(heading.children()[0].tag(), Some("h2"));
    assert_eq!(heading.text_content(), "Welcome");
}

#[test]
fn test_non_responsive_override_is_not_rendered() {
    let schema = Arc::new(SchemaRegistry::builtin());
    let evaluator = Evaluator::new().with_schema(schema);

    let heading = set_override(
        &Node::widget("h", "heading").with_style("fontWeight", 400),
        "fontWeight",
        Breakpoint::Mobile,
        Bucket::Style,
        json!(900),
    );
    assert!(evaluator.fragment_for(&heading).is_none());

    let doc = evaluator.evaluate(
        &Node::new("r", NodeKind::Root).with_child(heading),
        &EvalContext::editor(Breakpoint::Mobile),
    );
    assert_eq!(doc.find_by_node_id("h").unwrap().style("font-weight"), Some("400"));
}

#[test]
fn test_visibility_fragment_on_live_site() {
    let root = Node::new("r", NodeKind::Root)
        .with_child(Node::new("s", NodeKind::Section).with_advanced("hideOnMobile", true));
    let doc = Evaluator::new().evaluate(&root, &EvalContext::live());
    let css = doc.stylesheet();
    assert!(css.contains("@media (max-width: 480px)"));
    assert!(css.contains("display: none !important;"));
}

#[test]
fn test_custom_breakpoints_and_prefix() {
    let config: RenderConfig =
        serde_json::from_str(r#"{"tabletMaxWidth": 1024, "classPrefix": "pb-n-"}"#).unwrap();
    let node = set_override(
        &Node::widget("x", "text"),
        "fontSize",
        Breakpoint::Tablet,
        Bucket::Style,
        json!(15),
    );
    let css = synthesize_responsive_css(&node, &config).unwrap();
    assert!(css.contains("@media (max-width: 1024px)"));
    assert!(css.contains(".pb-n-x {"));
    assert!(css.contains("font-size: 15px !important;"));
}
