/// Naming helpers shared by the DOM and CSS sides of rendering.
///
/// The class name on a node's element and the selector in its responsive
/// stylesheet fragment must always agree, so both go through here.
use crate::config::RenderConfig;

/// Make a node id safe for use inside a class name or element id.
///
/// `[A-Za-z0-9-]` pass through; any other character (including `_`) is
/// written as `_{hex}_`, which keeps the mapping one-to-one.
pub fn escape_identifier(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
        } else {
            out.push_str(&format!("_{:x}_", c as u32));
        }
    }
    out
}

/// Class name carried by a node's element, e.g. `node-3fa2c1-7`
pub fn compute_class_name(node_id: &str, config: &RenderConfig) -> String {
    format!("{}{}", config.class_prefix, escape_identifier(node_id))
}

/// Element id of the `<style>` fragment injected for a node
pub fn fragment_element_id(node_id: &str, config: &RenderConfig) -> String {
    format!("{}{}", config.fragment_id_prefix, escape_identifier(node_id))
}
