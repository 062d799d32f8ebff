use crate::edges::label_width;
use crate::error::Result;
use crate::graph::GraphicContext;
use crate::node::{Cell, GraphNode};
use crate::property::Property;
use crate::scene::{LineShape, Region, TEXT_LINE_HEIGHT};

/// A participant: its name on top of a dashed lifeline.
///
/// Anchors sit on the centre of the name, so every message leaving or
/// reaching the actor lines up with the lifeline below it.
#[derive(Debug)]
pub struct ActorCell {
    name: Property<String>,
    lifeline: Property<f64>,
}

impl ActorCell {
    /// `length` is measured from the top of the name to the end of the
    /// lifeline.
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: Property::new(name.into()),
            lifeline: Property::new(length),
        }
    }

    pub fn name(&self) -> &Property<String> {
        &self.name
    }

    pub fn lifeline_length(&self) -> &Property<f64> {
        &self.lifeline
    }

    fn name_width(&self) -> Property<f64> {
        self.name.map(|name| label_width(name))
    }
}

impl GraphNode for ActorCell {
    fn create_graphic(&self, _ctx: &mut GraphicContext<'_>) -> Result<Region> {
        let width = self.name_width();
        let graphic = Region::pane(width.get(), self.lifeline.get());
        graphic.width().bind(&width);
        graphic.height().bind(&self.lifeline);

        let label = Region::text(self.name.clone());

        let line = LineShape::new(false).with_dash();
        let centre = width.map(|w| w / 2.0);
        line.start_x.bind(&centre);
        line.end_x.bind(&centre);
        line.start_y.set(TEXT_LINE_HEIGHT);
        line.end_y
            .bind(&self.lifeline.map(|length| length.max(TEXT_LINE_HEIGHT)));

        graphic.add_child(&label);
        graphic.add_child(&Region::line(line));
        Ok(graphic)
    }
}

impl Cell for ActorCell {
    fn x_anchor(&self, graphic: &Region) -> Property<f64> {
        graphic
            .layout_x()
            .combine(&self.name_width(), |x, w| x + w / 2.0)
    }

    fn y_anchor(&self, graphic: &Region) -> Property<f64> {
        graphic.layout_y().map(|y| y + TEXT_LINE_HEIGHT / 2.0)
    }

    fn width(&self, _graphic: &Region) -> Property<f64> {
        self.name_width()
    }

    fn height(&self, _graphic: &Region) -> Property<f64> {
        Property::new(TEXT_LINE_HEIGHT)
    }
}
