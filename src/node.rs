//! Capabilities shared by everything a graph can display.

use crate::error::{GraphError, Result};
use crate::graph::GraphicContext;
use crate::property::Property;
use crate::scene::Region;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Cell(CellId),
    Edge(EdgeId),
}

impl From<CellId> for NodeId {
    fn from(id: CellId) -> Self {
        NodeId::Cell(id)
    }
}

impl From<EdgeId> for NodeId {
    fn from(id: EdgeId) -> Self {
        NodeId::Edge(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Cell(id) => write!(f, "cell#{}", id.0),
            NodeId::Edge(id) => write!(f, "edge#{}", id.0),
        }
    }
}

/// Anything that can be shown on a graph canvas.
pub trait GraphNode: fmt::Debug {
    /// Builds the node's graphic. The graph calls this at most once per
    /// node and caches the result.
    fn create_graphic(&self, ctx: &mut GraphicContext<'_>) -> Result<Region>;

    fn on_added_to_graph(&self, _graphic: &Region) -> Result<()> {
        Ok(())
    }

    fn on_removed_from_graph(&self, _graphic: &Region) -> Result<()> {
        Ok(())
    }

    /// Returns `true` to consume the pointer event.
    fn on_hover_begin(&self, _graphic: &Region) -> bool {
        false
    }

    fn on_hover_end(&self, _graphic: &Region) -> bool {
        false
    }
}

/// A vertex. Anchors default to the centre of the graphic's layout box.
pub trait Cell: GraphNode {
    fn x_anchor(&self, graphic: &Region) -> Property<f64> {
        graphic.layout_x().combine(graphic.width(), |x, w| x + w / 2.0)
    }

    fn y_anchor(&self, graphic: &Region) -> Property<f64> {
        graphic.layout_y().combine(graphic.height(), |y, h| y + h / 2.0)
    }

    fn width(&self, graphic: &Region) -> Property<f64> {
        graphic.width().clone()
    }

    fn height(&self, graphic: &Region) -> Property<f64> {
        graphic.height().clone()
    }
}

/// A connection between two registered cells.
pub trait Edge: GraphNode {
    fn source(&self) -> CellId;

    fn target(&self) -> CellId;

    fn is_directed(&self) -> bool;

    /// Whether registering the edge makes `source` a child of `target`.
    fn links_cells(&self) -> bool {
        true
    }
}

/// The model's root. It only exists to parent orphan cells.
#[derive(Debug, Default)]
pub struct RootCell;

impl GraphNode for RootCell {
    fn create_graphic(&self, _ctx: &mut GraphicContext<'_>) -> Result<Region> {
        Err(GraphError::unsupported("the root cell has no graphic"))
    }
}

impl Cell for RootCell {}

/// A registered cell or edge.
#[derive(Debug, Clone)]
pub enum NodeRef {
    Cell(Rc<dyn Cell>),
    Edge(Rc<dyn Edge>),
}

impl NodeRef {
    pub fn create_graphic(&self, ctx: &mut GraphicContext<'_>) -> Result<Region> {
        match self {
            NodeRef::Cell(cell) => cell.create_graphic(ctx),
            NodeRef::Edge(edge) => edge.create_graphic(ctx),
        }
    }

    pub fn on_added_to_graph(&self, graphic: &Region) -> Result<()> {
        match self {
            NodeRef::Cell(cell) => cell.on_added_to_graph(graphic),
            NodeRef::Edge(edge) => edge.on_added_to_graph(graphic),
        }
    }

    pub fn on_removed_from_graph(&self, graphic: &Region) -> Result<()> {
        match self {
            NodeRef::Cell(cell) => cell.on_removed_from_graph(graphic),
            NodeRef::Edge(edge) => edge.on_removed_from_graph(graphic),
        }
    }

    pub fn on_hover_begin(&self, graphic: &Region) -> bool {
        match self {
            NodeRef::Cell(cell) => cell.on_hover_begin(graphic),
            NodeRef::Edge(edge) => edge.on_hover_begin(graphic),
        }
    }

    pub fn on_hover_end(&self, graphic: &Region) -> bool {
        match self {
            NodeRef::Cell(cell) => cell.on_hover_end(graphic),
            NodeRef::Edge(edge) => edge.on_hover_end(graphic),
        }
    }
}
