use crate::error::Result;
use crate::gestures::make_resizable;
use crate::graph::GraphicContext;
use crate::node::{Cell, GraphNode};
use crate::scene::Region;

/// Plain box cell, resizable by default.
#[derive(Debug, Clone)]
pub struct RectangleCell {
    width: f64,
    height: f64,
    resizable: bool,
    fill: Option<String>,
}

impl Default for RectangleCell {
    fn default() -> Self {
        Self::new()
    }
}

impl RectangleCell {
    pub fn new() -> Self {
        Self::with_size(50.0, 50.0)
    }

    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            resizable: true,
            fill: None,
        }
    }

    /// A box without resize handles.
    pub fn fixed(width: f64, height: f64) -> Self {
        Self {
            resizable: false,
            ..Self::with_size(width, height)
        }
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }
}

impl GraphNode for RectangleCell {
    fn create_graphic(&self, ctx: &mut GraphicContext<'_>) -> Result<Region> {
        let region = Region::rectangle(self.width, self.height, self.fill.clone());
        if self.resizable {
            make_resizable(&region, ctx.handle_size());
        }
        Ok(region)
    }
}

impl Cell for RectangleCell {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::scene::Shape;

    #[test]
    fn resizable_cell_brings_handles_onto_canvas() {
        let mut graph = Graph::new();
        let id = graph.model_mut().insert_cell(RectangleCell::with_size(80.0, 40.0));
        graph.model_mut().add_cell(id).unwrap();
        graph.end_update().unwrap();
        let canvas = graph.canvas().region().clone();
        assert_eq!(canvas.child_count(), 9);
        let handles = canvas
            .children()
            .iter()
            .filter(|c| matches!(c.shape(), Shape::Handle(_)))
            .count();
        assert_eq!(handles, 8);
    }

    #[test]
    fn fixed_cell_has_no_handles() {
        let mut graph = Graph::new();
        let id = graph.model_mut().insert_cell(RectangleCell::fixed(30.0, 30.0).with_fill("#ffcc00"));
        graph.model_mut().add_cell(id).unwrap();
        graph.end_update().unwrap();
        assert_eq!(graph.canvas().region().child_count(), 1);
        let region = graph.graphic(id).unwrap();
        assert!(matches!(region.shape(), Shape::Rectangle { fill: Some(f) } if f == "#ffcc00"));
    }
}
