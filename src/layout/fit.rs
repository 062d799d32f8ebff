use super::Layout;
use crate::config::CanvasConfig;
use crate::error::Result;
use crate::geometry::Point;
use crate::graph::Graph;
use crate::model::GraphModel;
use tracing::debug;

/// Scales and centres the canvas so every visible graphic fits inside its
/// nominal box, less `padding` on each side.
#[derive(Debug, Clone)]
pub struct FitToContentLayout {
    padding: f64,
}

impl Default for FitToContentLayout {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

impl FitToContentLayout {
    pub fn new(padding: f64) -> Self {
        Self {
            padding: padding.max(0.0),
        }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.fit_padding)
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }
}

impl Layout for FitToContentLayout {
    fn execute<M: GraphModel>(&mut self, graph: &mut Graph<M>) -> Result<()> {
        let canvas = graph.canvas();
        let Some(content) = canvas.content_bounds() else {
            return Ok(());
        };
        let (width, height) = canvas.nominal_size();
        let available_w = (width - 2.0 * self.padding).max(1.0);
        let available_h = (height - 2.0 * self.padding).max(1.0);

        let mut scale = f64::INFINITY;
        if content.width > 0.0 {
            scale = scale.min(available_w / content.width);
        }
        if content.height > 0.0 {
            scale = scale.min(available_h / content.height);
        }
        if !scale.is_finite() {
            scale = 1.0;
        }
        let scale = graph.viewport().clamp_scale(scale);

        let pivot = Point::new(width / 2.0, height / 2.0);
        let translate = (content.center() - pivot) * -scale;
        debug!(scale, tx = translate.x, ty = translate.y, "fit canvas to content");
        let canvas = graph.canvas();
        canvas.set_scale(scale);
        canvas.set_translate(translate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::RectangleCell;

    #[test]
    fn content_is_centred_and_scaled() {
        let mut graph = Graph::new();
        let a = graph.model_mut().insert_cell(RectangleCell::fixed(100.0, 50.0));
        let b = graph.model_mut().insert_cell(RectangleCell::fixed(100.0, 50.0));
        graph.model_mut().add_cell(a).unwrap();
        graph.model_mut().add_cell(b).unwrap();
        graph.end_update().unwrap();
        graph.graphic(a).unwrap().relocate(1000.0, 1000.0);
        graph.graphic(b).unwrap().relocate(1280.0, 1230.0);

        graph.layout(&mut FitToContentLayout::new(20.0)).unwrap();
        // content 380x280 into 760x560
        assert_eq!(graph.scale(), 2.0);
        let canvas = graph.canvas();
        let min = canvas.local_to_parent(Point::new(1000.0, 1000.0));
        let max = canvas.local_to_parent(Point::new(1380.0, 1280.0));
        assert!((min.x - 20.0).abs() < 1e-9 && (min.y - 20.0).abs() < 1e-9);
        assert!((max.x - 780.0).abs() < 1e-9 && (max.y - 580.0).abs() < 1e-9);
    }

    #[test]
    fn scale_respects_zoom_bounds() {
        let mut graph = Graph::new();
        let a = graph.model_mut().insert_cell(RectangleCell::fixed(1.0, 1.0));
        graph.model_mut().add_cell(a).unwrap();
        graph.end_update().unwrap();
        graph.layout(&mut FitToContentLayout::default()).unwrap();
        assert_eq!(graph.scale(), graph.viewport().max_scale());
    }

    #[test]
    fn empty_canvas_is_left_alone() {
        let mut graph = Graph::new();
        graph.layout(&mut FitToContentLayout::default()).unwrap();
        assert_eq!(graph.scale(), 1.0);
        assert_eq!(graph.canvas().translate(), Point::new(0.0, 0.0));
    }
}
