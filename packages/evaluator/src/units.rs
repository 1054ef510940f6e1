//! Length parsing and unit coercion for generated CSS

use pagebuilder_model::{format_number, Scalar};

/// Properties whose numeric values never take a unit
const UNITLESS_PROPERTIES: &[&str] = &[
    "line-height",
    "opacity",
    "z-index",
    "font-weight",
    "flex",
    "flex-grow",
    "flex-shrink",
    "order",
    "aspect-ratio",
    "column-count",
    "columns",
    "zoom",
    "grid-row",
    "grid-column",
    "grid-row-start",
    "grid-row-end",
    "grid-column-start",
    "grid-column-end",
    "grid-template-columns",
    "grid-template-rows",
];

/// Properties that only take keywords or colors
const KEYWORD_PROPERTIES: &[&str] = &[
    "display",
    "position",
    "visibility",
    "overflow",
    "flex-direction",
    "flex-wrap",
    "justify-content",
    "align-items",
    "align-content",
    "align-self",
    "text-align",
    "text-transform",
    "text-decoration",
    "font-style",
    "font-family",
    "color",
    "background",
    "background-color",
    "background-image",
    "border-style",
    "border-color",
    "object-fit",
    "cursor",
];

/// Numeric magnitude plus unit, e.g. `-1.5rem`
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: String,
}

impl Dimension {
    pub fn to_css(&self) -> String {
        format!("{}{}", format_number(self.magnitude), self.unit)
    }
}

/// Split a leading signed decimal from a trailing unit.
///
/// An empty unit becomes `default_unit`. Returns `None` when the text does
/// not start with a number or the trailing part is not a plain unit
/// (`"auto"`, `"10px 20px"`, `"calc(...)"`).
pub fn parse_dimension(raw: &str, default_unit: &str) -> Option<Dimension> {
    let text = raw.trim();
    let bytes = text.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let number = &text[..end];
    if !number[digits_start..].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let unit = text[end..].trim();
    if !unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
        return None;
    }

    Some(Dimension {
        magnitude: number.parse().ok()?,
        unit: if unit.is_empty() {
            default_unit.to_string()
        } else {
            unit.to_string()
        },
    })
}

pub fn is_unitless(property: &str) -> bool {
    UNITLESS_PROPERTIES.contains(&property)
}

/// Whether a bare number on `property` should receive the default unit
pub fn expects_length(property: &str) -> bool {
    !is_unitless(property) && !KEYWORD_PROPERTIES.contains(&property)
}

/// Render a scalar for `property`, adding the default unit to bare numbers
pub fn coerce_scalar(property: &str, value: &Scalar, default_unit: &str) -> String {
    match value {
        Scalar::Number(n) if expects_length(property) => {
            format!("{}{}", format_number(*n), default_unit)
        }
        Scalar::Number(n) => format_number(*n),
        Scalar::Text(text) if expects_length(property) => {
            match text.parse::<f64>() {
                // bare numeric string: "16" -> "16px"
                Ok(n) if n.is_finite() => format!("{}{}", format_number(n), default_unit),
                _ => text.clone(),
            }
        }
        Scalar::Text(text) => text.clone(),
    }
}
