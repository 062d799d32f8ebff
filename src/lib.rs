pub mod cartesian;
pub mod cells;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod edges;
pub mod error;
pub mod geometry;
pub mod gestures;
pub mod graph;
pub mod layout;
pub mod model;
pub mod node;
pub mod property;
pub mod render;
pub mod scene;
pub mod sequence;
pub mod theme;

pub use cartesian::{CartesianGraph, CartesianPoint, MultiplotModel, PlotMode};
pub use cells::RectangleCell;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, GraphConfig};
pub use edges::{LineEdge, SimpleEdge};
pub use error::{GraphError, Result};
pub use geometry::{Point, Rect};
pub use graph::{Graph, GraphicContext};
pub use layout::{FitToContentLayout, Layout, TreeLayout};
pub use model::{GraphModel, Model};
pub use node::{Cell, CellId, Edge, EdgeId, GraphNode, NodeId};
pub use property::Property;
pub use scene::{PannableCanvas, Region};
pub use sequence::{ActorCell, MessageEdge, SequenceDiagram};
