use crate::compiler::escape_html;
use crate::{compile_fragment, compile_page, compile_page_json, CompileError, CompileOptions};
use pagebuilder_evaluator::{set_override, Evaluator};
use pagebuilder_model::{Breakpoint, Bucket, Node, NodeKind};
use serde_json::json;

fn page() -> Node {
    let heading = Node::widget("h", "heading")
        .with_prop("content", "Summer <Sale>")
        .with_style("fontSize", "40px");
    let heading = set_override(&heading, "fontSize", Breakpoint::Mobile, Bucket::Style, json!("20px"));

    Node::new("root", NodeKind::Root).with_child(
        Node::new("s", NodeKind::Section).with_child(
            Node::new("c", NodeKind::Column)
                .with_child(heading)
                .with_child(Node::widget("d", "divider")),
        ),
    )
}

#[test]
fn test_compile_document_shell() {
    let options = CompileOptions {
        title: "Home & Garden".to_string(),
        ..Default::default()
    };
    let html = compile_page(&page(), &Evaluator::new(), options).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<html lang=\"en\">"));
    assert!(html.contains("<meta charset=\"UTF-8\">"));
    assert!(html.contains("<title>Home &amp; Garden</title>"));
    assert!(html.trim_end().ends_with("</html>"));
}

#[test]
fn test_compile_inline_styles_and_escaping() {
    let html = compile_page(&page(), &Evaluator::new(), CompileOptions::default()).unwrap();

    assert!(html.contains("font-size:40px"));
    assert!(html.contains("Summer &lt;Sale&gt;"));
    assert!(!html.contains("<Sale>"));
    assert!(html.contains("<section"));
}

#[test]
fn test_compile_embeds_responsive_fragments() {
    let html = compile_page(&page(), &Evaluator::new(), CompileOptions::default()).unwrap();

    assert!(html.contains("<style id=\"responsive-styles-h\">"));
    assert!(html.contains("@media (max-width: 480px)"));
    assert!(html.contains("font-size: 20px !important;"));
    // only the heading has overrides
    assert_eq!(html.matches("<style id=").count(), 1);
}

#[test]
fn test_self_closing_tags() {
    let html = compile_page(&page(), &Evaluator::new(), CompileOptions::default()).unwrap();
    assert!(html.contains("<hr"));
    assert!(!html.contains("</hr>"));
}

#[test]
fn test_compact_output() {
    let options = CompileOptions {
        pretty: false,
        ..Default::default()
    };
    let html = compile_page(&page(), &Evaluator::new(), options).unwrap();
    assert!(!html.contains('\n'));
    assert!(html.starts_with("<!DOCTYPE html><html"));
}

#[test]
fn test_compile_rejects_non_root() {
    let section = Node::new("s", NodeKind::Section);
    let result = compile_page(&section, &Evaluator::new(), CompileOptions::default());
    assert!(matches!(result, Err(CompileError::NotRoot(NodeKind::Section))));
}

#[test]
fn test_compile_page_json() {
    let json = r#"{"tree":{"id":"root","kind":"root","children":[
        {"id":"s","kind":"section","children":[
            {"id":"c","kind":"column","children":[
                {"id":"b","kind":"widget","widgetType":"button","props":{"text":"Shop","link":"/shop"}}
            ]}
        ]}
    ]}}"#;
    let html = compile_page_json(json, &Evaluator::new(), CompileOptions::default()).unwrap();
    assert!(html.contains("href=\"/shop\""));
    assert!(html.contains(">Shop</a>"));

    let err = compile_page_json("{not json", &Evaluator::new(), CompileOptions::default());
    assert!(matches!(err, Err(CompileError::Render(_))));
}

#[test]
fn test_compile_fragment_has_no_shell() {
    let html = compile_fragment(&page(), &Evaluator::new(), CompileOptions::default());
    assert!(!html.contains("<!DOCTYPE"));
    assert!(html.starts_with("<style id=\"responsive-styles-h\">"));
    assert!(html.contains("pb-widget-heading"));
}

#[test]
fn test_escape_html() {
    assert_eq!(escape_html("<a href='x'>&\"</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&quot;&lt;/a&gt;");
}
