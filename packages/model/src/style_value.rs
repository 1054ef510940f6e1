//! Typed view over style values.
//!
//! Values are stored as free-form JSON keyed by field name. Rendering needs
//! to know their shape, so each field name maps to a [`FieldCategory`] and
//! the raw value is classified into a [`StyleValue`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Number or string (a string may carry its own unit: `"2rem"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(Scalar::Text(s.trim().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => f.write_str(&format_number(*n)),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Format without a trailing `.0` for whole numbers
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Border {
    #[serde(default)]
    pub width: Option<Scalar>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub radius: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    #[serde(default)]
    pub offset_x: Option<Scalar>,
    #[serde(default)]
    pub offset_y: Option<Scalar>,
    #[serde(default)]
    pub blur: Option<Scalar>,
    #[serde(default)]
    pub spread: Option<Scalar>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub inset: bool,
}

/// `{top, right, bottom, left}` as used by padding and margin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxEdges {
    #[serde(default)]
    pub top: Option<Scalar>,
    #[serde(default)]
    pub right: Option<Scalar>,
    #[serde(default)]
    pub bottom: Option<Scalar>,
    #[serde(default)]
    pub left: Option<Scalar>,
}

impl BoxEdges {
    pub fn edges(&self) -> [(&'static str, Option<&Scalar>); 4] {
        [
            ("top", self.top.as_ref()),
            ("right", self.right.as_ref()),
            ("bottom", self.bottom.as_ref()),
            ("left", self.left.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    Scalar,
    Border,
    Shadow,
    BoxEdges,
}

impl FieldCategory {
    pub fn of(field: &str) -> Self {
        match field {
            "border" => FieldCategory::Border,
            "shadow" | "boxShadow" => FieldCategory::Shadow,
            "padding" | "margin" => FieldCategory::BoxEdges,
            _ => FieldCategory::Scalar,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Scalar(Scalar),
    Border(Border),
    Shadow(Shadow),
    BoxEdges(BoxEdges),
}

impl StyleValue {
    /// Classify a raw value stored under `field`.
    ///
    /// A primitive stored under a structured field (e.g. `padding: "10px"`)
    /// is kept as a scalar. Returns `None` for values that cannot be
    /// rendered (null, arrays, malformed objects).
    pub fn classify(field: &str, value: &Value) -> Option<Self> {
        if !value.is_object() {
            return Scalar::from_value(value).map(StyleValue::Scalar);
        }

        let structured = match FieldCategory::of(field) {
            FieldCategory::Border => serde_json::from_value(value.clone()).ok().map(StyleValue::Border),
            FieldCategory::Shadow => serde_json::from_value(value.clone()).ok().map(StyleValue::Shadow),
            FieldCategory::BoxEdges => {
                serde_json::from_value(value.clone()).ok().map(StyleValue::BoxEdges)
            }
            FieldCategory::Scalar => None,
        };

        if structured.is_none() {
            tracing::warn!(field, "Unrenderable structured style value");
        }
        structured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_box_edges() {
        let value = json!({"top": 10, "right": "1rem", "bottom": 0});
        match StyleValue::classify("padding", &value) {
            Some(StyleValue::BoxEdges(edges)) => {
                assert_eq!(edges.top, Some(Scalar::Number(10.0)));
                assert_eq!(edges.right, Some(Scalar::Text("1rem".to_string())));
                assert_eq!(edges.left, None);
            }
            other => panic!("Expected box edges, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_primitive_under_structured_field() {
        assert_eq!(
            StyleValue::classify("padding", &json!("12px")),
            Some(StyleValue::Scalar(Scalar::Text("12px".to_string())))
        );
    }

    #[test]
    fn test_classify_shadow_camel_case() {
        let value = json!({"offsetX": 2, "offsetY": 4, "blur": 8, "color": "rgba(0,0,0,.2)"});
        match StyleValue::classify("shadow", &value) {
            Some(StyleValue::Shadow(shadow)) => {
                assert_eq!(shadow.offset_y, Some(Scalar::Number(4.0)));
                assert!(!shadow.inset);
            }
            other => panic!("Expected shadow, got {:?}", other),
        }
    }

    #[test]
    fn test_unrenderable_values() {
        assert_eq!(StyleValue::classify("color", &Value::Null), None);
        assert_eq!(StyleValue::classify("color", &json!({"r": 1})), None);
        assert_eq!(StyleValue::classify("color", &json!("  ")), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-2.5), "-2.5");
    }
}
