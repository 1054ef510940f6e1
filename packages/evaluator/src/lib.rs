//! # Page Builder Evaluator
//!
//! Style resolution and rendering for page trees.
//!
//! - [`cascade`]: desktop → tablet/mobile resolution of style and advanced fields
//! - [`css`]: longhand expansion, unit coercion, responsive fragment synthesis
//! - [`evaluator`]: tree → [`VirtualDomDocument`] for the canvas and the live site
//! - [`registry`]: per-node fragment lifecycle (upsert on render, release on unmount)
//!
//! ```rust,ignore
//! use pagebuilder_evaluator::{EvalContext, Evaluator};
//!
//! let doc = Evaluator::new().evaluate(&root, &EvalContext::live());
//! for fragment in &doc.fragments {
//!     println!("<style id=\"{}\">{}</style>", fragment.element_id, fragment.css);
//! }
//! ```

pub mod cascade;
pub mod config;
pub mod css;
pub mod evaluator;
pub mod registry;
pub mod units;
pub mod utils;
pub mod vdom;
pub mod widgets;

pub use cascade::{clear_override, is_overridden, resolve_value, set_override, CascadeResolver};
pub use config::RenderConfig;
pub use css::{
    build_fragment, expand_field, flatten_buckets, inline_declarations, responsive_rules,
    rules_to_css, synthesize_responsive_css, CssDeclaration, CssRule, StyleFragment,
};
pub use evaluator::{parse_page, EvalContext, Evaluator, RenderError, RenderMode, RenderResult};
pub use registry::{apply_fragment_patches, FragmentPatch, StyleRegistry};
pub use units::{coerce_scalar, parse_dimension, Dimension};
pub use utils::{compute_class_name, escape_identifier, fragment_element_id};
pub use vdom::{VNode, VirtualDomDocument};
pub use widgets::{embed_url, RenderFn, WidgetContext, WidgetRegistry};
