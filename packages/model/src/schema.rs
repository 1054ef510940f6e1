//! # Control Schema Registry
//!
//! Static description of the editable fields per node kind / widget type.
//! The editor UI builds its panels from it; the style cascade only reads
//! two things: a field's `default` and its `responsive` flag.
//!
//! Registries are plain data and are usually loaded from JSON:
//!
//! ```json
//! {
//!   "kinds":   { "section": { "style": [{ "name": "padding", "type": "boxEdges", "responsive": true }] } },
//!   "widgets": { "heading": { "content": [{ "name": "content", "type": "text" }] } }
//! }
//! ```

use crate::node::{Bucket, Node, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Slider,
    Select,
    Color,
    Dimension,
    Boolean,
    Url,
    Icon,
    Media,
    Border,
    Shadow,
    BoxEdges,
    Repeater,
}

/// Option entry for `select` fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One editable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub responsive: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
            responsive: false,
            options: Vec::new(),
            min: None,
            max: None,
            unit: None,
        }
    }

    pub fn responsive(mut self) -> Self {
        self.responsive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Pull a number into the field's declared range
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

/// Fields of one kind or widget type, grouped by editor tab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSchema {
    #[serde(default)]
    pub content: Vec<Field>,
    #[serde(default)]
    pub style: Vec<Field>,
    #[serde(default)]
    pub advanced: Vec<Field>,
}

impl ControlSchema {
    pub fn fields(&self, bucket: Bucket) -> &[Field] {
        match bucket {
            Bucket::Style => &self.style,
            Bucket::Advanced => &self.advanced,
        }
    }

    pub fn field(&self, bucket: Bucket, name: &str) -> Option<&Field> {
        self.fields(bucket).iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    #[serde(default)]
    kinds: HashMap<NodeKind, ControlSchema>,
    #[serde(default)]
    widgets: HashMap<String, ControlSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn register_kind(&mut self, kind: NodeKind, schema: ControlSchema) {
        self.kinds.insert(kind, schema);
    }

    pub fn register_widget(&mut self, widget_type: impl Into<String>, schema: ControlSchema) {
        self.widgets.insert(widget_type.into(), schema);
    }

    /// Schema for a node: its widget type for widgets, its kind otherwise
    pub fn schema_for(&self, node: &Node) -> Option<&ControlSchema> {
        match (&node.kind, &node.widget_type) {
            (NodeKind::Widget, Some(widget_type)) => self.widgets.get(widget_type),
            (NodeKind::Widget, None) => None,
            (kind, _) => self.kinds.get(kind),
        }
    }

    pub fn field(&self, node: &Node, bucket: Bucket, name: &str) -> Option<&Field> {
        self.schema_for(node)?.field(bucket, name)
    }

    pub fn widget_types(&self) -> impl Iterator<Item = &str> {
        self.widgets.keys().map(String::as_str)
    }

    /// Registry with the stock storefront widgets and containers
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        let spacing = || {
            vec![
                Field::new("padding", FieldType::BoxEdges).responsive(),
                Field::new("margin", FieldType::BoxEdges).responsive(),
                Field::new("background", FieldType::Color),
                Field::new("border", FieldType::Border).responsive(),
                Field::new("shadow", FieldType::Shadow),
            ]
        };
        let layout = || {
            vec![
                Field::new("display", FieldType::Select).responsive(),
                Field::new("direction", FieldType::Select).responsive(),
                Field::new("justify", FieldType::Select).responsive(),
                Field::new("align", FieldType::Select).responsive(),
                Field::new("gap", FieldType::Dimension).responsive(),
                Field::new("width", FieldType::Dimension).responsive(),
                Field::new("customClass", FieldType::Text),
                Field::new("cssId", FieldType::Text),
                Field::new("hideOnDesktop", FieldType::Boolean).with_default(false),
                Field::new("hideOnTablet", FieldType::Boolean).with_default(false),
                Field::new("hideOnMobile", FieldType::Boolean).with_default(false),
            ]
        };
        let typography = || {
            vec![
                Field::new("color", FieldType::Color).responsive(),
                Field::new("fontSize", FieldType::Dimension).responsive(),
                Field::new("fontWeight", FieldType::Select),
                Field::new("lineHeight", FieldType::Number).responsive(),
                Field::new("textAlign", FieldType::Select).responsive(),
            ]
        };

        for kind in [NodeKind::Root, NodeKind::Section, NodeKind::Column] {
            registry.register_kind(
                kind,
                ControlSchema {
                    content: Vec::new(),
                    style: spacing(),
                    advanced: layout(),
                },
            );
        }

        let widget = |content: Vec<Field>, extra_style: Vec<Field>| ControlSchema {
            content,
            style: typography().into_iter().chain(spacing()).chain(extra_style).collect(),
            advanced: layout(),
        };

        registry.register_widget(
            "heading",
            widget(
                vec![
                    Field::new("content", FieldType::Text).with_default("Heading"),
                    Field::new("tag", FieldType::Select).with_default("h2"),
                ],
                vec![],
            ),
        );
        registry.register_widget(
            "text",
            widget(vec![Field::new("content", FieldType::Textarea)], vec![]),
        );
        registry.register_widget(
            "button",
            widget(
                vec![
                    Field::new("text", FieldType::Text).with_default("Click here"),
                    Field::new("link", FieldType::Url).with_default("#"),
                ],
                vec![Field::new("backgroundColor", FieldType::Color).responsive()],
            ),
        );
        registry.register_widget(
            "image",
            widget(
                vec![
                    Field::new("src", FieldType::Media),
                    Field::new("alt", FieldType::Text),
                ],
                vec![
                    Field::new("width", FieldType::Dimension).responsive(),
                    Field::new("height", FieldType::Dimension).responsive(),
                    Field::new("objectFit", FieldType::Select),
                ],
            ),
        );
        registry.register_widget(
            "video",
            widget(
                vec![
                    Field::new("url", FieldType::Url),
                    Field::new("autoplay", FieldType::Boolean).with_default(false),
                ],
                vec![Field::new("height", FieldType::Dimension).responsive()],
            ),
        );
        registry.register_widget(
            "divider",
            widget(
                vec![],
                vec![Field::new("height", FieldType::Dimension).responsive()],
            ),
        );
        registry.register_widget(
            "iconlist",
            widget(
                vec![
                    Field::new("items", FieldType::Repeater).with_default(json!([])),
                    Field::new("itemCount", FieldType::Number)
                        .with_default(3)
                        .with_range(1.0, 50.0),
                ],
                vec![],
            ),
        );
        registry.register_widget(
            "icon",
            widget(
                vec![Field::new("icon", FieldType::Icon).with_default("fa fa-star")],
                vec![],
            ),
        );

        registry
    }
}
