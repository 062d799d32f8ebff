use crate::edges::label_width;
use crate::error::Result;
use crate::graph::GraphicContext;
use crate::node::{CellId, Edge, GraphNode};
use crate::property::Property;
use crate::scene::{LineShape, Region, TEXT_LINE_HEIGHT};

/// An arrow from one actor's lifeline to another's, `y_offset` below the
/// actors' anchors, with its name written above the middle of the arrow.
///
/// Messages never change parent links, so an actor may message itself or
/// answer a message it received.
#[derive(Debug)]
pub struct MessageEdge {
    source: CellId,
    target: CellId,
    name: String,
    y_offset: Property<f64>,
}

impl MessageEdge {
    pub fn new(source: CellId, target: CellId, name: impl Into<String>) -> Self {
        Self {
            source,
            target,
            name: name.into(),
            y_offset: Property::new(0.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn y_offset(&self) -> &Property<f64> {
        &self.y_offset
    }
}

impl GraphNode for MessageEdge {
    fn create_graphic(&self, ctx: &mut GraphicContext<'_>) -> Result<Region> {
        let from = ctx.anchor(self.source)?;
        let to = ctx.anchor(self.target)?;

        let line = LineShape::new(true);
        line.start_x.bind(&from.x);
        line.start_y
            .bind(&from.y.combine(&self.y_offset, |y, offset| y + offset));
        line.end_x.bind(&to.x);
        line.end_y
            .bind(&to.y.combine(&self.y_offset, |y, offset| y + offset));

        let text = Region::text(Property::new(self.name.clone()));
        let half_width = label_width(&self.name) / 2.0;
        text.layout_x()
            .bind(&line.start_x.combine(&line.end_x, move |s, e| (s + e) / 2.0 - half_width));
        text.layout_y().bind(
            &line
                .start_y
                .combine(&line.end_y, |s, e| (s + e) / 2.0 - TEXT_LINE_HEIGHT),
        );

        let pane = Region::pane(0.0, 0.0);
        pane.add_child(&Region::line(line));
        pane.add_child(&text);
        Ok(pane)
    }
}

impl Edge for MessageEdge {
    fn source(&self) -> CellId {
        self.source
    }

    fn target(&self) -> CellId {
        self.target
    }

    fn is_directed(&self) -> bool {
        true
    }

    fn links_cells(&self) -> bool {
        false
    }
}
