use crate::error::Result;
use crate::graph::GraphicContext;
use crate::node::{Cell, GraphNode};
use crate::property::Property;
use crate::scene::{Region, TEXT_CHAR_WIDTH, TEXT_LINE_HEIGHT};
use serde::{Deserialize, Serialize};

/// How a point is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletType {
    #[default]
    Circle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointStyle {
    pub radius: f64,
    pub bullet: BulletType,
    pub fill: String,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            radius: 5.0,
            bullet: BulletType::Circle,
            fill: "black".to_string(),
        }
    }
}

/// A data point. In a model, points link to each other in strictly
/// increasing x order; the point with lesser x is the parent.
#[derive(Debug)]
pub struct CartesianPoint {
    x: Property<f64>,
    y: Property<f64>,
    radius: Property<f64>,
    fill: Property<String>,
    bullet: BulletType,
    label: Property<String>,
}

impl CartesianPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self::with_style(x, y, &PointStyle::default())
    }

    pub fn with_style(x: f64, y: f64, style: &PointStyle) -> Self {
        let x = Property::new(x);
        let y = Property::new(y);
        let label = x.combine(&y, |x, y| {
            format!("({},{})", format_coordinate(*x), format_coordinate(*y))
        });
        Self {
            x,
            y,
            radius: Property::new(style.radius),
            fill: Property::new(style.fill.clone()),
            bullet: style.bullet,
            label,
        }
    }

    pub fn x(&self) -> f64 {
        self.x.get()
    }

    pub fn y(&self) -> f64 {
        self.y.get()
    }

    pub fn x_property(&self) -> &Property<f64> {
        &self.x
    }

    pub fn y_property(&self) -> &Property<f64> {
        &self.y
    }

    pub fn radius(&self) -> &Property<f64> {
        &self.radius
    }

    pub fn fill(&self) -> &Property<String> {
        &self.fill
    }

    pub fn bullet(&self) -> BulletType {
        self.bullet
    }

    /// Coordinate text, kept in step with x and y.
    pub fn label(&self) -> &Property<String> {
        &self.label
    }
}

impl GraphNode for CartesianPoint {
    /// A pane holding the bullet with the coordinate label above it. The
    /// pane sits at `(x, -y)` so larger y values are drawn higher, and is
    /// translated so the bullet's centre lands on that spot.
    fn create_graphic(&self, _ctx: &mut GraphicContext<'_>) -> Result<Region> {
        let graphic = Region::pane(0.0, 0.0);
        graphic.layout_x().bind(&self.x);
        graphic.layout_y().bind(&self.y.map(|y| -y));
        graphic.translate_x().bind(&self.radius.map(|r| -r));
        graphic.translate_y().bind(&self.radius.map(|r| -r));

        let bullet = match self.bullet {
            BulletType::Circle => Region::circle(self.radius.clone(), self.fill.clone()),
        };

        let label = Region::text(self.label.clone());
        label.layout_x().bind(&self.radius.combine(&self.label, |r, text| {
            r - text.chars().count() as f64 * TEXT_CHAR_WIDTH / 2.0
        }));
        label.layout_y().set(-TEXT_LINE_HEIGHT);

        graphic.add_child(&label);
        graphic.add_child(&bullet);
        Ok(graphic)
    }
}

impl Cell for CartesianPoint {
    fn x_anchor(&self, _graphic: &Region) -> Property<f64> {
        self.x.clone()
    }

    fn y_anchor(&self, _graphic: &Region) -> Property<f64> {
        self.y.map(|y| -y)
    }

    fn width(&self, _graphic: &Region) -> Property<f64> {
        self.radius.map(|r| r * 2.0)
    }

    fn height(&self, _graphic: &Region) -> Property<f64> {
        self.radius.map(|r| r * 2.0)
    }
}

/// Formats a coordinate with at most two fraction digits, rounding half
/// away from zero and dropping trailing zeros.
pub fn format_coordinate(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Shape;

    #[test]
    fn coordinates_round_half_up_to_two_places() {
        assert_eq!(format_coordinate(1.0), "1");
        assert_eq!(format_coordinate(2.5), "2.5");
        assert_eq!(format_coordinate(3.14159), "3.14");
        assert_eq!(format_coordinate(0.125), "0.13");
        assert_eq!(format_coordinate(-1.999), "-2");
        assert_eq!(format_coordinate(-0.001), "0");
        assert_eq!(format_coordinate(1200.0), "1200");
    }

    #[test]
    fn label_tracks_coordinates() {
        let point = CartesianPoint::new(1.0, 2.5);
        assert_eq!(point.label().get(), "(1,2.5)");
        point.x_property().set(-3.256);
        assert_eq!(point.label().get(), "(-3.26,2.5)");
        point.y_property().set(0.0);
        assert_eq!(point.label().get(), "(-3.26,0)");
    }

    #[test]
    fn style_is_applied() {
        let style = PointStyle {
            radius: 3.0,
            fill: "#ff0000".to_string(),
            ..PointStyle::default()
        };
        let point = CartesianPoint::with_style(0.0, 0.0, &style);
        assert_eq!(point.radius().get(), 3.0);
        assert_eq!(point.fill().get(), "#ff0000");
        assert_eq!(point.bullet(), BulletType::Circle);
    }

    #[test]
    fn graphic_centres_bullet_on_flipped_coordinates() {
        let mut graph = crate::graph::Graph::new();
        let id = graph.model_mut().insert_cell(CartesianPoint::new(10.0, 20.0));
        let graphic = graph.get_graphic(id).unwrap();
        let bullet = graphic.children()[1].clone();
        assert!(matches!(bullet.shape(), Shape::Circle { .. }));
        assert_eq!(graphic.offset().x, 5.0);
        assert_eq!(graphic.offset().y, -25.0);
        let anchor = graph.anchor(id).unwrap();
        assert_eq!(anchor.point().x, 10.0);
        assert_eq!(anchor.point().y, -20.0);
        assert_eq!(anchor.width.get(), 10.0);
    }
}
