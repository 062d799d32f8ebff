//! Placement passes over a graph's graphics.

mod fit;
mod tree;

pub use fit::FitToContentLayout;
pub use tree::TreeLayout;

use crate::error::Result;
use crate::graph::Graph;
use crate::model::GraphModel;

pub trait Layout {
    fn execute<M: GraphModel>(&mut self, graph: &mut Graph<M>) -> Result<()>;
}
