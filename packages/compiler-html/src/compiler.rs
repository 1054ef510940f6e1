use pagebuilder_evaluator::{parse_page, EvalContext, Evaluator, RenderError, StyleFragment, VNode};
use pagebuilder_model::{Node, NodeKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur during HTML compilation
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Page tree must start with a root node, found {0}")]
    NotRoot(NodeKind),
}

/// Options for HTML compilation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Document title
    pub title: String,
    /// `lang` attribute of `<html>`
    pub lang: String,
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            title: "Storefront".to_string(),
            lang: "en".to_string(),
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

struct Context {
    options: CompileOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: CompileOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        let indent = self.options.indent.clone();
        for _ in 0..self.depth {
            self.add(&indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Compile a page tree to a standalone HTML document for the live site
#[instrument(skip_all, fields(root_id = %root.id))]
pub fn compile_page(root: &Node, evaluator: &Evaluator, options: CompileOptions) -> Result<String, CompileError> {
    if root.kind != NodeKind::Root {
        return Err(CompileError::NotRoot(root.kind));
    }

    let doc = evaluator.evaluate(root, &EvalContext::live());
    let mut ctx = Context::new(options);

    ctx.add_line("<!DOCTYPE html>");
    let lang = escape_html(&ctx.options.lang);
    ctx.add_line(&format!("<html lang=\"{}\">", lang));
    ctx.indent();

    compile_head(&doc.fragments, &mut ctx);

    ctx.add_line("<body>");
    ctx.indent();
    for node in &doc.nodes {
        compile_vnode(node, &mut ctx);
    }
    ctx.dedent();
    ctx.add_line("</body>");

    ctx.dedent();
    ctx.add_line("</html>");

    Ok(ctx.get_output())
}

/// Compile a stored page document (`{ "tree": ... }` or a bare root)
pub fn compile_page_json(json: &str, evaluator: &Evaluator, options: CompileOptions) -> Result<String, CompileError> {
    let root = parse_page(json)?;
    compile_page(&root, evaluator, options)
}

/// Body markup plus fragment `<style>` elements, for embedding in an
/// existing storefront template
pub fn compile_fragment(root: &Node, evaluator: &Evaluator, options: CompileOptions) -> String {
    let doc = evaluator.evaluate(root, &EvalContext::live());
    let mut ctx = Context::new(options);
    for fragment in &doc.fragments {
        compile_style_element(fragment, &mut ctx);
    }
    for node in &doc.nodes {
        compile_vnode(node, &mut ctx);
    }
    ctx.get_output()
}

fn compile_head(fragments: &[StyleFragment], ctx: &mut Context) {
    ctx.add_line("<head>");
    ctx.indent();

    ctx.add_line("<meta charset=\"UTF-8\">");
    ctx.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    let title = escape_html(&ctx.options.title);
    ctx.add_line(&format!("<title>{}</title>", title));

    for fragment in fragments {
        compile_style_element(fragment, ctx);
    }

    ctx.dedent();
    ctx.add_line("</head>");
}

fn compile_style_element(fragment: &StyleFragment, ctx: &mut Context) {
    ctx.add_line(&format!("<style id=\"{}\">", escape_html(&fragment.element_id)));
    ctx.indent();
    for line in fragment.css.lines().filter(|l| !l.trim().is_empty()) {
        // fragment text is generated, but never let it close the element
        ctx.add_line(&line.replace("</", "<\\/"));
    }
    ctx.dedent();
    ctx.add_line("</style>");
}

fn compile_vnode(node: &VNode, ctx: &mut Context) {
    match node {
        VNode::Text { content } => {
            if !content.is_empty() {
                ctx.add_line(&escape_html(content));
            }
        }
        VNode::Element { tag, children, .. } => {
            let open = open_tag(node);

            if is_self_closing(tag) {
                ctx.add_line(&open);
                return;
            }

            // text-only elements stay on one line
            if children.iter().all(|c| matches!(c, VNode::Text { .. })) {
                let text: String = children
                    .iter()
                    .map(|c| escape_html(&c.text_content()))
                    .collect();
                ctx.add_line(&format!("{}{}</{}>", open, text, tag));
                return;
            }

            ctx.add_line(&open);
            ctx.indent();
            for child in children {
                compile_vnode(child, ctx);
            }
            ctx.dedent();
            ctx.add_line(&format!("</{}>", tag));
        }
    }
}

fn open_tag(node: &VNode) -> String {
    let VNode::Element { tag, attributes, styles, .. } = node else {
        return String::new();
    };

    let mut out = format!("<{}", tag);
    for (name, value) in attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
    }
    if !styles.is_empty() {
        out.push_str(&format!(" style=\"{}\"", escape_html(&node.inline_style())));
    }
    out.push('>');
    out
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_self_closing(tag: &str) -> bool {
    matches!(
        tag,
        "img"
            | "input"
            | "br"
            | "hr"
            | "meta"
            | "link"
            | "area"
            | "base"
            | "col"
            | "embed"
            | "source"
            | "track"
            | "wbr"
    )
}
