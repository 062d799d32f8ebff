//! Keeps a canvas of graphics in step with a model.
//!
//! The graph owns the node to graphic mapping, applies model diffs in
//! [`Graph::end_update`], and routes pointer input to the gesture
//! controllers.

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::geometry::{Point, Rect};
use crate::gestures::node::{make_draggable, make_hoverable, make_undraggable, make_unhoverable};
use crate::gestures::{MouseEvent, NodeGestures, ResizeGesture, ScrollEvent, ViewportGestures};
use crate::layout::Layout;
use crate::model::{GraphModel, Model};
use crate::node::{CellId, NodeId, NodeRef};
use crate::property::Property;
use crate::scene::{GraphicId, PannableCanvas, Region};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Bidirectional node to graphic mapping.
#[derive(Debug, Default)]
pub struct GraphicRegistry {
    by_node: HashMap<NodeId, Region>,
    by_graphic: HashMap<GraphicId, NodeId>,
    creating: HashSet<NodeId>,
}

impl GraphicRegistry {
    pub fn get(&self, node: NodeId) -> Option<&Region> {
        self.by_node.get(&node)
    }

    pub fn node_of(&self, graphic: GraphicId) -> Option<NodeId> {
        self.by_graphic.get(&graphic).copied()
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    fn insert(&mut self, node: NodeId, graphic: Region) {
        self.by_graphic.insert(graphic.id(), node);
        self.by_node.insert(node, graphic);
    }
}

/// Reactive position and size a cell exposes to edges.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub x: Property<f64>,
    pub y: Property<f64>,
    pub width: Property<f64>,
    pub height: Property<f64>,
}

impl Anchor {
    pub fn point(&self) -> Point {
        Point::new(self.x.get(), self.y.get())
    }

    /// Box of the given size centred on the anchor point.
    pub fn bounds(&self) -> Rect {
        let (w, h) = (self.width.get(), self.height.get());
        Rect::new(self.x.get() - w / 2.0, self.y.get() - h / 2.0, w, h)
    }
}

/// What a node sees of its graph while building its graphic.
pub struct GraphicContext<'a> {
    model: &'a Model,
    graphics: &'a mut GraphicRegistry,
    config: &'a GraphConfig,
}

impl GraphicContext<'_> {
    pub fn model(&self) -> &Model {
        self.model
    }

    pub fn config(&self) -> &GraphConfig {
        self.config
    }

    pub fn handle_size(&self) -> f64 {
        self.config.interaction.handle_size
    }

    /// Graphic of another node, creating it on first use.
    pub fn graphic(&mut self, node: impl Into<NodeId>) -> Result<Region> {
        let node = node.into();
        if let Some(region) = self.graphics.get(node) {
            return Ok(region.clone());
        }
        let Some(node_ref) = self.model.node(node) else {
            return Err(GraphError::invalid(format!("{node} is not registered")));
        };
        if !self.graphics.creating.insert(node) {
            return Err(GraphError::invalid(format!(
                "graphic of {node} requested while it is being created"
            )));
        }
        let created = node_ref.create_graphic(self);
        self.graphics.creating.remove(&node);
        let region = created?;
        trace!(%node, graphic = %region.id(), "created graphic");
        self.graphics.insert(node, region.clone());
        Ok(region)
    }

    pub fn anchor(&mut self, cell: CellId) -> Result<Anchor> {
        let graphic = self.graphic(cell)?;
        let Some(cell_ref) = self.model.cell(cell) else {
            return Err(GraphError::invalid(format!("cell#{} is not registered", cell.0)));
        };
        Ok(Anchor {
            x: cell_ref.x_anchor(&graphic),
            y: cell_ref.y_anchor(&graphic),
            width: cell_ref.width(&graphic),
            height: cell_ref.height(&graphic),
        })
    }
}

pub struct Graph<M: GraphModel = Model> {
    model: M,
    graphics: GraphicRegistry,
    canvas: PannableCanvas,
    config: GraphConfig,
    viewport: ViewportGestures,
    node_gestures: NodeGestures,
    resize: ResizeGesture,
    use_node_gestures: bool,
    use_viewport_gestures: bool,
    hovered: Option<NodeId>,
    transparent: Option<Region>,
    updating: bool,
}

impl Graph<Model> {
    pub fn new() -> Self {
        Self::with_model(Model::new())
    }
}

impl Default for Graph<Model> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: GraphModel> Graph<M> {
    pub fn with_model(model: M) -> Self {
        let config = GraphConfig::default();
        let canvas = PannableCanvas::new(config.canvas.width, config.canvas.height);
        Self {
            model,
            graphics: GraphicRegistry::default(),
            canvas,
            viewport: ViewportGestures::default(),
            node_gestures: NodeGestures::new(config.interaction.drag_button),
            resize: ResizeGesture::default(),
            use_node_gestures: config.interaction.use_node_gestures,
            use_viewport_gestures: config.interaction.use_viewport_gestures,
            hovered: None,
            transparent: None,
            updating: false,
            config,
        }
    }

    pub fn with_config(model: M, config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let mut graph = Self::with_model(model);
        graph.viewport = ViewportGestures::new(&config.viewport)?;
        graph.node_gestures = NodeGestures::new(config.interaction.drag_button);
        graph.use_node_gestures = config.interaction.use_node_gestures;
        graph.use_viewport_gestures = config.interaction.use_viewport_gestures;
        graph.canvas = PannableCanvas::new(config.canvas.width, config.canvas.height);
        graph.config = config;
        Ok(graph)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn canvas(&self) -> &PannableCanvas {
        &self.canvas
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportGestures {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportGestures {
        &mut self.viewport
    }

    pub fn node_gestures_mut(&mut self) -> &mut NodeGestures {
        &mut self.node_gestures
    }

    pub fn scale(&self) -> f64 {
        self.canvas.scale()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    // ── Graphics ────────────────────────────────────────────────────────

    /// The node's graphic, created and cached on first request.
    pub fn get_graphic(&mut self, node: impl Into<NodeId>) -> Result<Region> {
        let mut ctx = GraphicContext {
            model: self.model.base(),
            graphics: &mut self.graphics,
            config: &self.config,
        };
        ctx.graphic(node)
    }

    /// The cached graphic, if one was created.
    pub fn graphic(&self, node: impl Into<NodeId>) -> Option<Region> {
        self.graphics.get(node.into()).cloned()
    }

    pub fn graph_node(&self, graphic: GraphicId) -> Option<NodeId> {
        self.graphics.node_of(graphic)
    }

    pub fn anchor(&mut self, cell: CellId) -> Result<Anchor> {
        let mut ctx = GraphicContext {
            model: self.model.base(),
            graphics: &mut self.graphics,
            config: &self.config,
        };
        ctx.anchor(cell)
    }

    pub fn graphics(&self) -> &GraphicRegistry {
        &self.graphics
    }

    // ── Updates ─────────────────────────────────────────────────────────

    /// Opens a batch of model changes. The canvas is left as it is; the
    /// batch is applied by `end_update`.
    pub fn begin_update(&mut self) {
        self.updating = true;
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Applies pending model changes to the canvas, then commits the model.
    /// Stops at the first node that fails; earlier nodes stay applied.
    pub fn end_update(&mut self) -> Result<()> {
        self.updating = false;
        let base = self.model.base();
        let added_edges = base.added_edges().to_vec();
        let added_cells = base.added_cells().to_vec();
        let removed_edges = base.removed_edges().to_vec();
        let removed_cells = base.removed_cells().to_vec();
        debug!(
            added_edges = added_edges.len(),
            added_cells = added_cells.len(),
            removed_edges = removed_edges.len(),
            removed_cells = removed_cells.len(),
            "applying graph update"
        );

        for id in added_edges {
            self.add_node(id.into())?;
        }
        for id in added_cells {
            self.add_node(id.into())?;
        }
        for id in removed_edges {
            self.remove_node(id.into())?;
        }
        for id in removed_cells {
            self.remove_node(id.into())?;
        }
        self.model.end_update();
        Ok(())
    }

    fn describe(&self, node: NodeId) -> String {
        match self.model.base().node(node) {
            Some(NodeRef::Cell(cell)) => format!("{node} {cell:?}"),
            Some(NodeRef::Edge(edge)) => format!("{node} {edge:?}"),
            None => node.to_string(),
        }
    }

    fn add_node(&mut self, node: NodeId) -> Result<()> {
        self.try_add_node(node)
            .map_err(|err| GraphError::attach("add", self.describe(node), err))
    }

    fn try_add_node(&mut self, node: NodeId) -> Result<()> {
        let region = self.get_graphic(node)?;
        let Some(node_ref) = self.model.base().node(node) else {
            return Err(GraphError::invalid(format!("{node} is not registered")));
        };
        self.canvas.add(&region);
        if self.use_node_gestures {
            apply_node_gestures(node, &region, true);
        }
        node_ref.on_added_to_graph(&region)?;
        trace!(%node, "added to canvas");
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> Result<()> {
        self.try_remove_node(node)
            .map_err(|err| GraphError::attach("remove", self.describe(node), err))
    }

    fn try_remove_node(&mut self, node: NodeId) -> Result<()> {
        let Some(region) = self.graphics.get(node).cloned() else {
            return Ok(());
        };
        let Some(node_ref) = self.model.base().node(node) else {
            return Err(GraphError::invalid(format!("{node} is not registered")));
        };
        self.canvas.remove(&region);
        if self.hovered == Some(node) {
            self.hovered = None;
        }
        node_ref.on_removed_from_graph(&region)?;
        trace!(%node, "removed from canvas");
        Ok(())
    }

    /// Runs a placement pass over the graph.
    pub fn layout<L: Layout>(&mut self, layout: &mut L) -> Result<()> {
        layout.execute(self)
    }

    // ── Gesture toggles ─────────────────────────────────────────────────

    pub fn use_node_gestures(&self) -> bool {
        self.use_node_gestures
    }

    /// Turns cell dragging and hover on or off, including for graphics that
    /// are already on the canvas.
    pub fn set_use_node_gestures(&mut self, enabled: bool) {
        if self.use_node_gestures == enabled {
            return;
        }
        self.use_node_gestures = enabled;
        debug!(enabled, "node gestures toggled");
        let base = self.model.base();
        let live = base
            .all_cells()
            .iter()
            .map(|id| NodeId::from(*id))
            .chain(base.all_edges().iter().map(|id| NodeId::from(*id)));
        for node in live {
            if let Some(region) = self.graphics.get(node) {
                apply_node_gestures(node, region, enabled);
            }
        }
        if !enabled {
            self.node_gestures.cancel();
            self.hovered = None;
        }
    }

    pub fn use_viewport_gestures(&self) -> bool {
        self.use_viewport_gestures
    }

    pub fn set_use_viewport_gestures(&mut self, enabled: bool) {
        if self.use_viewport_gestures == enabled {
            return;
        }
        self.use_viewport_gestures = enabled;
        debug!(enabled, "viewport gestures toggled");
        if !enabled {
            self.revert_transparency();
        }
    }

    // ── Input ───────────────────────────────────────────────────────────

    pub fn mouse_pressed(&mut self, event: &MouseEvent) -> bool {
        let hit = self.canvas.pick(event.scene());
        if let Some(region) = &hit {
            if self.resize.press(region, event, self.node_gestures.drag_button()) {
                return true;
            }
            if self.use_node_gestures {
                if let Some(cell) = self.draggable_ancestor(region) {
                    if self.node_gestures.press(&cell, event, self.canvas.scale()) {
                        return true;
                    }
                }
            }
        }
        if self.use_viewport_gestures && self.viewport.press(&self.canvas, event) {
            if let Some(cell) = hit.and_then(|r| self.cell_ancestor(&r)) {
                self.revert_transparency();
                cell.set_mouse_transparent_recursive(true);
                self.transparent = Some(cell);
            }
            return true;
        }
        false
    }

    pub fn mouse_dragged(&mut self, event: &MouseEvent) -> bool {
        let scale = self.canvas.scale();
        if self.resize.is_resizing() {
            return self.resize.drag(event, scale);
        }
        if self.node_gestures.is_dragging() {
            return self.node_gestures.drag(event, scale);
        }
        self.use_viewport_gestures && self.viewport.drag(&self.canvas, event)
    }

    pub fn mouse_released(&mut self, event: &MouseEvent) -> bool {
        let mut consumed = self.resize.release();
        consumed |= self.node_gestures.release(event);
        if event.button == self.viewport.pan_button() {
            consumed |= self.viewport.release(event);
            self.revert_transparency();
        }
        consumed
    }

    /// Tracks which node is under the pointer and dispatches hover hooks.
    pub fn mouse_moved(&mut self, event: &MouseEvent) -> bool {
        let target = if self.use_node_gestures {
            self.canvas
                .pick(event.scene())
                .and_then(|r| self.hoverable_node(&r))
        } else {
            None
        };
        if target == self.hovered {
            return false;
        }
        let mut consumed = false;
        if let Some(previous) = self.hovered.take() {
            if let (Some(node), Some(graphic)) = (self.model.base().node(previous), self.graphics.get(previous)) {
                consumed |= node.on_hover_end(graphic);
            }
        }
        if let Some(next) = target {
            if let (Some(node), Some(graphic)) = (self.model.base().node(next), self.graphics.get(next)) {
                consumed |= node.on_hover_begin(graphic);
            }
            self.hovered = Some(next);
        }
        consumed
    }

    pub fn scroll(&mut self, event: &ScrollEvent) -> bool {
        self.use_viewport_gestures && self.viewport.scroll(&self.canvas, event)
    }

    fn revert_transparency(&mut self) {
        if let Some(region) = self.transparent.take() {
            region.set_mouse_transparent_recursive(false);
        }
    }

    fn draggable_ancestor(&self, region: &Region) -> Option<Region> {
        region
            .ancestors()
            .find(|r| r.is_draggable() && self.graphics.node_of(r.id()).is_some())
    }

    fn cell_ancestor(&self, region: &Region) -> Option<Region> {
        region
            .ancestors()
            .find(|r| matches!(self.graphics.node_of(r.id()), Some(NodeId::Cell(_))))
    }

    fn hoverable_node(&self, region: &Region) -> Option<NodeId> {
        region
            .ancestors()
            .filter(|r| r.is_hoverable())
            .find_map(|r| self.graphics.node_of(r.id()))
    }
}

fn apply_node_gestures(node: NodeId, region: &Region, enabled: bool) {
    match (node, enabled) {
        (NodeId::Cell(_), true) => {
            make_draggable(region);
            make_hoverable(region);
        }
        (NodeId::Cell(_), false) => {
            make_undraggable(region);
            make_unhoverable(region);
        }
        (NodeId::Edge(_), true) => make_hoverable(region),
        (NodeId::Edge(_), false) => make_unhoverable(region),
    }
}
