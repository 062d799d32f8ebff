use super::multiplot::MultiplotModel;
use super::point::PointStyle;
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::geometry::Point;
use crate::graph::Graph;
use crate::layout::{FitToContentLayout, Layout};
use crate::model::GraphModel;
use crate::node::{CellId, EdgeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which parts of a plot are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum PlotMode {
    /// Scatter plot.
    Points,
    /// Line graph without bullets.
    Lines,
    #[default]
    ConnectedPoints,
}

impl PlotMode {
    pub fn shows_points(self) -> bool {
        matches!(self, PlotMode::Points | PlotMode::ConnectedPoints)
    }

    pub fn shows_lines(self) -> bool {
        matches!(self, PlotMode::Lines | PlotMode::ConnectedPoints)
    }
}

/// A graph that plots datasets on shared cartesian axes. Gestures are off
/// and every operation commits right away.
pub struct CartesianGraph {
    graph: Graph<MultiplotModel>,
    plot_mode: PlotMode,
    point_style: PointStyle,
    layout: FitToContentLayout,
    generated_names: usize,
}

impl CartesianGraph {
    pub fn new(plot_mode: PlotMode) -> Self {
        let mut graph = Graph::with_model(MultiplotModel::new());
        graph.set_use_node_gestures(false);
        graph.set_use_viewport_gestures(false);
        Self {
            graph,
            plot_mode,
            point_style: PointStyle::default(),
            layout: FitToContentLayout::default(),
            generated_names: 0,
        }
    }

    pub fn with_config(plot_mode: PlotMode, config: GraphConfig) -> Result<Self> {
        let layout = FitToContentLayout::from_config(&config.canvas);
        let mut graph = Graph::with_config(MultiplotModel::new(), config)?;
        graph.set_use_node_gestures(false);
        graph.set_use_viewport_gestures(false);
        Ok(Self {
            graph,
            plot_mode,
            point_style: PointStyle::default(),
            layout,
            generated_names: 0,
        })
    }

    pub fn graph(&self) -> &Graph<MultiplotModel> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph<MultiplotModel> {
        &mut self.graph
    }

    pub fn model(&self) -> &MultiplotModel {
        self.graph.model()
    }

    pub fn plot_mode(&self) -> PlotMode {
        self.plot_mode
    }

    pub fn set_plot_mode(&mut self, mode: PlotMode) {
        self.plot_mode = mode;
        self.apply_plot_mode();
    }

    pub fn point_style(&self) -> &PointStyle {
        &self.point_style
    }

    /// Style used for points added from now on.
    pub fn set_point_style(&mut self, style: PointStyle) {
        self.point_style = style;
    }

    fn generate_name(&mut self) -> String {
        loop {
            self.generated_names += 1;
            let name = format!("plot {}", self.generated_names);
            if self.model().plot(&name).is_none() {
                return name;
            }
        }
    }

    /// Adds a dataset as a new plot, replacing any plot of the same name.
    /// Returns the plot's name, generated when `name` is `None`.
    pub fn add_dataset(&mut self, dataset: &[Point], name: Option<&str>) -> Result<String> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.generate_name(),
        };
        self.graph
            .model_mut()
            .add_plot(&name, dataset, &self.point_style)?;
        self.commit()?;
        Ok(name)
    }

    /// Adds one point to `plot`, or to the default plot. Creates a plot when
    /// there is none yet.
    pub fn add_point(&mut self, point: Point, plot: Option<&str>) -> Result<CellId> {
        let name = match plot.map(str::to_string).or_else(|| self.model().plot_default().map(str::to_string)) {
            Some(name) => name,
            None => self.generate_name(),
        };
        let id = self
            .graph
            .model_mut()
            .add_point(&name, point, &self.point_style)?;
        self.commit()?;
        Ok(id)
    }

    /// Joins `point` to the next point of its plot.
    pub fn add_edge(&mut self, point: CellId) -> Result<Option<EdgeId>> {
        let edge = self.graph.model_mut().add_edge(point)?;
        self.commit()?;
        Ok(edge)
    }

    pub fn add_last_edge(&mut self, plot: Option<&str>) -> Result<Option<EdgeId>> {
        let edge = self.graph.model_mut().add_last_edge(plot)?;
        self.commit()?;
        Ok(edge)
    }

    pub fn remove_point(&mut self, point: CellId) -> Result<()> {
        self.graph.model_mut().remove_point(point)?;
        self.commit()
    }

    /// Fits the canvas to the plotted data.
    pub fn layout(&mut self) -> Result<()> {
        self.layout.execute(&mut self.graph)
    }

    /// Cartesian graphs always fit to content; other layouts are rejected.
    pub fn layout_with<L: Layout>(&mut self, _layout: &mut L) -> Result<()> {
        Err(GraphError::unsupported("cartesian graph layout is fixed"))
    }

    fn commit(&mut self) -> Result<()> {
        self.graph.begin_update();
        self.graph.end_update()?;
        self.apply_plot_mode();
        Ok(())
    }

    fn apply_plot_mode(&self) {
        let base = self.graph.model().base();
        let (points, lines) = (self.plot_mode.shows_points(), self.plot_mode.shows_lines());
        for &cell in base.all_cells() {
            if let Some(graphic) = self.graph.graphic(cell) {
                graphic.set_visible(points);
            }
        }
        for &edge in base.all_edges() {
            if let Some(graphic) = self.graph.graphic(edge) {
                graphic.set_visible(lines);
            }
        }
        debug!(mode = ?self.plot_mode, "applied plot mode");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Vec<Point> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn dataset_is_committed_with_generated_name() {
        let mut plot = CartesianGraph::new(PlotMode::ConnectedPoints);
        let name = plot.add_dataset(&line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)]), None).unwrap();
        assert_eq!(name, "plot 1");
        let base = plot.model().base();
        assert_eq!(base.all_cells().len(), 3);
        assert_eq!(base.all_edges().len(), 2);
        assert!(base.added_cells().is_empty());
        assert_eq!(plot.graph().canvas().region().child_count(), 5);
        assert!(!plot.graph().use_node_gestures());
        assert!(!plot.graph().use_viewport_gestures());
    }

    #[test]
    fn plot_mode_hides_points_or_lines() {
        let mut plot = CartesianGraph::new(PlotMode::Points);
        plot.add_dataset(&line(&[(0.0, 0.0), (1.0, 1.0)]), Some("a")).unwrap();
        let base = plot.model().base();
        let cell = plot.graph().graphic(base.all_cells()[0]).unwrap();
        let edge = plot.graph().graphic(base.all_edges()[0]).unwrap();
        assert!(cell.is_visible() && !edge.is_visible());

        plot.set_plot_mode(PlotMode::Lines);
        assert!(!cell.is_visible() && edge.is_visible());
        plot.set_plot_mode(PlotMode::ConnectedPoints);
        assert!(cell.is_visible() && edge.is_visible());
    }

    #[test]
    fn point_goes_to_default_plot_and_edge_joins_it() {
        let mut plot = CartesianGraph::new(PlotMode::ConnectedPoints);
        plot.add_dataset(&line(&[(0.0, 0.0), (2.0, 2.0)]), Some("a")).unwrap();
        let id = plot.add_point(Point::new(1.0, 5.0), None).unwrap();
        assert_eq!(plot.model().plot("a").unwrap()[1], id);
        let edge = plot.add_edge(id).unwrap();
        assert!(edge.is_some());
        assert_eq!(plot.model().base().all_edges().len(), 2);
    }

    #[test]
    fn first_point_creates_a_plot() {
        let mut plot = CartesianGraph::new(PlotMode::Points);
        plot.add_point(Point::new(3.0, 3.0), None).unwrap();
        assert_eq!(plot.model().plots_count(), 1);
        assert_eq!(plot.model().plot_default(), Some("plot 1"));
    }

    #[test]
    fn layout_fits_points_and_rejects_other_layouts() {
        let mut plot = CartesianGraph::new(PlotMode::Points);
        plot.add_dataset(&line(&[(0.0, 0.0), (100.0, 50.0)]), None).unwrap();
        plot.layout().unwrap();
        assert!(plot.graph().scale() > 1.0);
        let err = plot
            .layout_with(&mut crate::layout::TreeLayout::default())
            .unwrap_err();
        assert!(matches!(err, GraphError::Unsupported(_)));
    }
}
