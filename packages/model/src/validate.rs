/// Structural validation for page trees loaded from storage
use crate::node::{Breakpoint, Bucket, Node, NodeKind};
use crate::schema::SchemaRegistry;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    /// Data-quality problem; rendering still works
    Warning,
    /// Breaks a tree invariant
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub level: ValidationLevel,
    pub node_id: String,
    pub message: String,
}

impl ValidationIssue {
    fn warning(node_id: &str, message: impl Into<String>) -> Self {
        Self {
            level: ValidationLevel::Warning,
            node_id: node_id.to_string(),
            message: message.into(),
        }
    }

    fn error(node_id: &str, message: impl Into<String>) -> Self {
        Self {
            level: ValidationLevel::Error,
            node_id: node_id.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == ValidationLevel::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            ValidationLevel::Warning => "warning",
            ValidationLevel::Error => "error",
        };
        write!(f, "{} [{}]: {}", level, self.node_id, self.message)
    }
}

/// Tree validator. Pass a schema to also check override fields.
pub struct Validator<'a> {
    schema: Option<&'a SchemaRegistry>,
    seen_ids: HashSet<String>,
    issues: Vec<ValidationIssue>,
}

impl<'a> Validator<'a> {
    pub fn new(schema: Option<&'a SchemaRegistry>) -> Self {
        Self {
            schema,
            seen_ids: HashSet::new(),
            issues: Vec::new(),
        }
    }

    pub fn validate(mut self, root: &Node) -> Vec<ValidationIssue> {
        if root.kind != NodeKind::Root {
            self.issues.push(ValidationIssue::error(
                &root.id,
                format!("Tree must start at a root node, found {}", root.kind),
            ));
        }
        self.validate_node(root, true);
        self.issues
    }

    fn validate_node(&mut self, node: &Node, is_top: bool) {
        if node.id.is_empty() {
            self.issues.push(ValidationIssue::error(&node.id, "Node id is empty"));
        } else if !self.seen_ids.insert(node.id.clone()) {
            self.issues
                .push(ValidationIssue::error(&node.id, "Duplicate node id"));
        }

        if node.kind == NodeKind::Root && !is_top {
            self.issues.push(ValidationIssue::error(
                &node.id,
                "Root node found below the top of the tree",
            ));
        }

        match (&node.kind, &node.widget_type) {
            (NodeKind::Widget, None) => self
                .issues
                .push(ValidationIssue::error(&node.id, "Widget is missing widgetType")),
            (kind, Some(widget_type)) if *kind != NodeKind::Widget => {
                self.issues.push(ValidationIssue::warning(
                    &node.id,
                    format!("{} carries widgetType '{}'", kind, widget_type),
                ))
            }
            _ => {}
        }

        for child in &node.children {
            if !node.kind.can_contain(child.kind) {
                self.issues.push(ValidationIssue::error(
                    &child.id,
                    format!("A {} cannot contain a {}", node.kind, child.kind),
                ));
            }
        }

        self.check_overrides(node);

        for child in &node.children {
            self.validate_node(child, false);
        }
    }

    fn check_overrides(&mut self, node: &Node) {
        let Some(schema) = self.schema else {
            return;
        };
        let Some(control) = schema.schema_for(node) else {
            return;
        };

        for breakpoint in Breakpoint::RESPONSIVE {
            for bucket in Bucket::ALL {
                let Some(overrides) = node.overrides(breakpoint, bucket) else {
                    continue;
                };
                for field in overrides.keys() {
                    match control.field(bucket, field) {
                        None => self.issues.push(ValidationIssue::warning(
                            &node.id,
                            format!("Orphan {} override '{}' on {}", bucket, field, breakpoint),
                        )),
                        Some(def) if !def.responsive => {
                            self.issues.push(ValidationIssue::warning(
                                &node.id,
                                format!(
                                    "Override for non-responsive {} field '{}' on {}",
                                    bucket, field, breakpoint
                                ),
                            ))
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }
}

/// Validate a tree without schema checks
pub fn validate(root: &Node) -> Vec<ValidationIssue> {
    Validator::new(None).validate(root)
}

pub fn validate_with_schema(root: &Node, schema: &SchemaRegistry) -> Vec<ValidationIssue> {
    Validator::new(Some(schema)).validate(root)
}
