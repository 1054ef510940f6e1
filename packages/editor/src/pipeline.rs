//! # Editing Pipeline
//!
//! Coordinates the canvas loop: Mutate → Evaluate → Sync fragments
//!
//! The pipeline owns the store, the evaluator and the fragment registry,
//! so every render keeps the injected stylesheet fragments in lock-step
//! with the tree: re-rendered nodes replace their fragment, deleted nodes
//! release theirs, and unmounting the canvas releases everything.

use crate::mutations::Mutation;
use crate::store::{BuilderStore, CommandOutcome};
use pagebuilder_evaluator::{EvalContext, Evaluator, FragmentPatch, StyleRegistry, VirtualDomDocument};
use pagebuilder_model::Breakpoint;
use tracing::instrument;

pub struct EditorPipeline {
    store: BuilderStore,
    evaluator: Evaluator,
    registry: StyleRegistry,
}

/// Result of one pass through the pipeline
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub outcome: CommandOutcome,

    /// Store version after the command
    pub version: u64,

    /// Full render of the canvas
    pub vdom: VirtualDomDocument,

    /// Fragment edits the host document must mirror
    pub fragment_patches: Vec<FragmentPatch>,
}

impl EditorPipeline {
    pub fn new(store: BuilderStore, evaluator: Evaluator) -> Self {
        Self {
            store,
            evaluator,
            registry: StyleRegistry::new(),
        }
    }

    pub fn store(&self) -> &BuilderStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BuilderStore {
        &mut self.store
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    fn context(&self) -> EvalContext {
        let ctx = EvalContext::editor(self.store.device());
        match self.store.selected() {
            Some(id) => ctx.with_selected(id),
            None => ctx,
        }
    }

    /// Apply a command and re-render
    #[instrument(skip_all, fields(mutation = mutation.name()))]
    pub fn dispatch(&mut self, mutation: &Mutation) -> PipelineResult {
        let outcome = self.store.apply(mutation);
        let (vdom, fragment_patches) = self.render_pass();
        PipelineResult {
            outcome,
            version: self.store.version(),
            vdom,
            fragment_patches,
        }
    }

    /// Render the canvas for the current device, syncing fragments
    pub fn render(&mut self) -> (VirtualDomDocument, Vec<FragmentPatch>) {
        self.render_pass()
    }

    pub fn set_device(&mut self, device: Breakpoint) -> (VirtualDomDocument, Vec<FragmentPatch>) {
        self.store.set_device(device);
        self.render_pass()
    }

    pub fn undo(&mut self) -> (VirtualDomDocument, Vec<FragmentPatch>) {
        self.store.undo();
        self.render_pass()
    }

    pub fn redo(&mut self) -> (VirtualDomDocument, Vec<FragmentPatch>) {
        self.store.redo();
        self.render_pass()
    }

    /// Release every injected fragment, e.g. when leaving the editor
    pub fn unmount(&mut self) -> Vec<FragmentPatch> {
        self.registry.clear()
    }

    fn render_pass(&mut self) -> (VirtualDomDocument, Vec<FragmentPatch>) {
        let vdom = self.evaluator.evaluate(self.store.root(), &self.context());
        let patches = self.registry.sync(&vdom.fragments);
        (vdom, patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use pagebuilder_model::{IdGenerator, Node, NodeKind};
    use serde_json::json;

    fn pipeline() -> EditorPipeline {
        let root = Node::new("root", NodeKind::Root).with_child(
            Node::new("s", NodeKind::Section).with_child(
                Node::new("c", NodeKind::Column).with_child(Node::widget("h", "heading")),
            ),
        );
        let store = BuilderStore::new("home", root, StoreConfig::default())
            .with_id_generator(IdGenerator::from_seed("p"));
        EditorPipeline::new(store, Evaluator::new())
    }

    #[test]
    fn test_pipeline_initial_render() {
        let mut pipeline = pipeline();
        let (vdom, patches) = pipeline.render();
        assert!(vdom.find_by_node_id("h").is_some());
        assert!(patches.is_empty());
    }

    #[test]
    fn test_dispatch_injects_and_releases_fragments() {
        let mut pipeline = pipeline();
        let result = pipeline.dispatch(&Mutation::UpdateResponsiveStyle {
            node_id: "h".into(),
            breakpoint: Breakpoint::Mobile,
            values: [("fontSize".to_string(), json!("14px"))].into(),
        });
        assert!(result.outcome.is_applied());
        assert!(matches!(result.fragment_patches.as_slice(), [FragmentPatch::Insert { .. }]));

        let result = pipeline.dispatch(&Mutation::DeleteNode { node_id: "c".into() });
        assert!(matches!(result.fragment_patches.as_slice(), [FragmentPatch::Remove { .. }]));
        assert!(pipeline.registry().is_empty());
    }

    #[test]
    fn test_device_switch_changes_inline_styles() {
        let mut pipeline = pipeline();
        pipeline.dispatch(&Mutation::UpdateResponsiveStyle {
            node_id: "h".into(),
            breakpoint: Breakpoint::Tablet,
            values: [("color".to_string(), json!("blue"))].into(),
        });

        let (vdom, patches) = pipeline.set_device(Breakpoint::Tablet);
        assert_eq!(vdom.find_by_node_id("h").unwrap().style("color"), Some("blue"));
        assert!(patches.is_empty());

        let (vdom, _) = pipeline.set_device(Breakpoint::Mobile);
        assert_eq!(vdom.find_by_node_id("h").unwrap().style("color"), None);
    }

    #[test]
    fn test_unmount_releases_all() {
        let mut pipeline = pipeline();
        pipeline.dispatch(&Mutation::UpdateResponsiveAdvanced {
            node_id: "s".into(),
            breakpoint: Breakpoint::Mobile,
            values: [("direction".to_string(), json!("column"))].into(),
        });
        assert_eq!(pipeline.registry().len(), 1);
        assert_eq!(pipeline.unmount().len(), 1);
        assert!(pipeline.registry().is_empty());
    }
}
