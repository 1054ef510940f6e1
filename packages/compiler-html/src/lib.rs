//! Static HTML output for published storefront pages
//!
//! Renders a page tree in live mode and writes a complete document:
//! inline desktop styles on every element, one `<style>` element per
//! node that carries responsive overrides.

mod compiler;

pub use compiler::{compile_fragment, compile_page, compile_page_json, CompileError, CompileOptions};

#[cfg(test)]
mod tests;
