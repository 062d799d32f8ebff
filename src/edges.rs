use crate::error::Result;
use crate::geometry::{Point, rectangle_intercept};
use crate::graph::{Anchor, GraphicContext};
use crate::node::{CellId, Edge, GraphNode};
use crate::property::{Observable, Property, derive};
use crate::scene::{LineShape, Region, TEXT_CHAR_WIDTH, TEXT_LINE_HEIGHT};

/// Straight edge that makes its source a child of its target.
#[derive(Debug, Clone)]
pub struct LineEdge {
    source: CellId,
    target: CellId,
    directed: bool,
    label: Option<String>,
}

impl LineEdge {
    pub fn new(source: CellId, target: CellId, directed: bool) -> Self {
        Self {
            source,
            target,
            directed,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl GraphNode for LineEdge {
    fn create_graphic(&self, ctx: &mut GraphicContext<'_>) -> Result<Region> {
        line_graphic(ctx, self.source, self.target, self.directed, self.label.as_deref())
    }
}

impl Edge for LineEdge {
    fn source(&self) -> CellId {
        self.source
    }

    fn target(&self) -> CellId {
        self.target
    }

    fn is_directed(&self) -> bool {
        self.directed
    }
}

/// Edge drawn between two cells without touching their parent links.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleEdge {
    source: CellId,
    target: CellId,
    directed: bool,
}

impl SimpleEdge {
    pub fn new(source: CellId, target: CellId, directed: bool) -> Self {
        Self {
            source,
            target,
            directed,
        }
    }

    /// Whether both edges join the same cells. Undirected edges match in
    /// either orientation.
    pub fn same_connection(&self, other: &SimpleEdge) -> bool {
        if self.directed != other.directed {
            return false;
        }
        let forward = self.source == other.source && self.target == other.target;
        let backward = self.source == other.target && self.target == other.source;
        forward || (!self.directed && backward)
    }
}

impl GraphNode for SimpleEdge {
    fn create_graphic(&self, ctx: &mut GraphicContext<'_>) -> Result<Region> {
        line_graphic(ctx, self.source, self.target, self.directed, None)
    }
}

impl Edge for SimpleEdge {
    fn source(&self) -> CellId {
        self.source
    }

    fn target(&self) -> CellId {
        self.target
    }

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn links_cells(&self) -> bool {
        false
    }
}

/// A pane holding the line and, if given, a label at its midpoint. The
/// line runs from anchor to anchor; a directed line stops where it enters
/// the target's box.
fn line_graphic(
    ctx: &mut GraphicContext<'_>,
    source: CellId,
    target: CellId,
    directed: bool,
    label: Option<&str>,
) -> Result<Region> {
    let from = ctx.anchor(source)?;
    let to = ctx.anchor(target)?;

    let line = LineShape::new(directed);
    line.start_x.bind(&from.x);
    line.start_y.bind(&from.y);
    if directed {
        let end = clipped_end(&from, &to);
        line.end_x.bind(&end.map(|p| p.x));
        line.end_y.bind(&end.map(|p| p.y));
    } else {
        line.end_x.bind(&to.x);
        line.end_y.bind(&to.y);
    }

    let pane = Region::pane(0.0, 0.0);
    pane.add_child(&Region::line(line.clone()));

    if let Some(label) = label {
        let text = Region::text(Property::new(label.to_string()));
        let half_width = label_width(label) / 2.0;
        text.layout_x()
            .bind(&line.start_x.combine(&line.end_x, move |s, e| (s + e) / 2.0 - half_width));
        text.layout_y().bind(
            &line
                .start_y
                .combine(&line.end_y, |s, e| (s + e) / 2.0 - TEXT_LINE_HEIGHT / 2.0),
        );
        pane.add_child(&text);
    }
    Ok(pane)
}

fn clipped_end(from: &Anchor, to: &Anchor) -> Property<Point> {
    let deps: [&dyn Observable; 6] = [&from.x, &from.y, &to.x, &to.y, &to.width, &to.height];
    let (from, to) = (from.clone(), to.clone());
    derive(&deps, move || {
        let target = to.point();
        rectangle_intercept(from.point(), target, &to.bounds()).unwrap_or(target)
    })
}

/// Width a label of `text` occupies.
pub fn label_width(text: &str) -> f64 {
    text.chars().count() as f64 * TEXT_CHAR_WIDTH
}
