use super::point::{CartesianPoint, PointStyle};
use crate::edges::SimpleEdge;
use crate::error::{GraphError, Result};
use crate::geometry::Point;
use crate::model::{GraphModel, Model};
use crate::node::{CellId, EdgeId};
use std::collections::HashMap;
use tracing::debug;

/// Model holding named plots of cartesian points.
///
/// Each plot is a list of points ordered by x. Points of a plot are
/// chained in the underlying model and joined by non-linking edges.
#[derive(Debug, Default)]
pub struct MultiplotModel {
    base: Model,
    plots: HashMap<String, Vec<CellId>>,
    plot_default: Option<String>,
}

impl MultiplotModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plots_count(&self) -> usize {
        self.plots.len()
    }

    pub fn plot(&self, name: &str) -> Option<&[CellId]> {
        self.plots.get(name).map(Vec::as_slice)
    }

    /// Plot used when none is named. The first plot created, unless set.
    pub fn plot_default(&self) -> Option<&str> {
        self.plot_default.as_deref()
    }

    pub fn set_plot_default(&mut self, name: &str) -> Result<()> {
        if !self.plots.contains_key(name) {
            return Err(GraphError::invalid(format!("no plot named '{name}'")));
        }
        self.plot_default = Some(name.to_string());
        Ok(())
    }

    /// Replaces the plot `name` with `dataset`, chaining the points by x and
    /// joining consecutive ones with edges. The old plot's points and edges
    /// are queued for removal.
    pub fn add_plot(&mut self, name: &str, dataset: &[Point], style: &PointStyle) -> Result<()> {
        check_distinct_x(dataset)?;
        if let Some(old) = self.plots.remove(name) {
            debug!(plot = name, points = old.len(), "replacing plot");
            for id in old {
                self.discard_point(id)?;
            }
        }
        if self.plot_default.is_none() {
            self.plot_default = Some(name.to_string());
        }

        let mut plot = Vec::with_capacity(dataset.len());
        let mut previous = None;
        for p in dataset {
            let id = self.base.insert_cell(CartesianPoint::with_style(p.x, p.y, style));
            if let Some(previous) = previous {
                self.base.add_cell_parent(id, previous)?;
            }
            self.base.add_cell(id)?;
            plot.push(id);
            previous = Some(id);
        }
        plot.sort_by(|a, b| self.x_of(*a).total_cmp(&self.x_of(*b)));
        for &id in &plot {
            self.add_edge(id)?;
        }
        debug!(plot = name, points = plot.len(), "added plot");
        self.plots.insert(name.to_string(), plot);
        Ok(())
    }

    /// Adds one point to `plot_name` at the position its x value requires,
    /// creating the plot if needed. No edge is created.
    pub fn add_point(&mut self, plot_name: &str, point: Point, style: &PointStyle) -> Result<CellId> {
        if let Some(plot) = self.plots.get(plot_name) {
            if plot.iter().any(|id| self.x_of(*id) == point.x) {
                return Err(GraphError::invalid(format!(
                    "plot '{plot_name}' already has a point at x={}",
                    point.x
                )));
            }
        }
        if !point.x.is_finite() {
            return Err(GraphError::invalid(format!("point x={} is not finite", point.x)));
        }

        let id = self.base.insert_cell(CartesianPoint::with_style(point.x, point.y, style));
        let first = self.plots.get(plot_name).and_then(|plot| plot.first().copied());
        let index = match first {
            None => 0,
            Some(first) if point.x > self.x_of(first) => {
                self.base.add_cell_child(first, id)?;
                let next = self.base.chain_neighbours(id).1;
                let plot = self.plots.get(plot_name).map(Vec::as_slice).unwrap_or_default();
                next.and_then(|next| plot.iter().position(|p| *p == next))
                    .unwrap_or(plot.len())
            }
            Some(first) => {
                self.base.add_cell_child(id, first)?;
                0
            }
        };
        self.plots.entry(plot_name.to_string()).or_default().insert(index, id);
        if self.plot_default.is_none() {
            self.plot_default = Some(plot_name.to_string());
        }
        self.base.add_cell(id)?;
        Ok(id)
    }

    /// Takes a point out of its plot and chain and queues it, and every
    /// edge touching it, for removal.
    pub fn remove_point(&mut self, id: CellId) -> Result<()> {
        if self.base.point(id).is_none() {
            return Err(GraphError::invalid(format!("cell#{} is not a cartesian point", id.0)));
        }
        for plot in self.plots.values_mut() {
            if let Some(index) = plot.iter().position(|p| *p == id) {
                plot.remove(index);
                break;
            }
        }
        self.discard_point(id)
    }

    fn discard_point(&mut self, id: CellId) -> Result<()> {
        self.base.unlink_point(id);
        for edge in self.base.edges_touching(id) {
            self.base.remove_edge(edge)?;
        }
        self.base.remove_cell(id)
    }

    /// Cells can only enter this model as plot points.
    pub fn add_cell(&mut self, _id: CellId) -> Result<()> {
        Err(GraphError::unsupported(
            "cells can only be added to a multiplot model as points of a plot",
        ))
    }

    /// Queues an edge from `point` to the next point of its plot. Returns
    /// `None` for the last point. A pending or live edge already joining
    /// the two points is returned instead of a second one.
    pub fn add_edge(&mut self, point: CellId) -> Result<Option<EdgeId>> {
        if self.base.point(point).is_none() {
            return Err(GraphError::invalid(format!("cell#{} is not a cartesian point", point.0)));
        }
        let Some(next) = self.base.chain_neighbours(point).1 else {
            return Ok(None);
        };
        let wanted = SimpleEdge::new(point, next, false);
        let existing = self.base.edges_touching(point).into_iter().find(|id| {
            !self.base.removed_edges().contains(id)
                && self.base.edge(*id).is_some_and(|edge| {
                    !edge.links_cells()
                        && wanted.same_connection(&SimpleEdge::new(
                            edge.source(),
                            edge.target(),
                            edge.is_directed(),
                        ))
                })
        });
        if let Some(edge) = existing {
            return Ok(Some(edge));
        }
        let edge = self.base.insert_edge(SimpleEdge::new(point, next, false))?;
        self.base.add_edge(edge)?;
        Ok(Some(edge))
    }

    /// Joins the last two points of a plot, or of the default plot when no
    /// name is given.
    pub fn add_last_edge(&mut self, plot_name: Option<&str>) -> Result<Option<EdgeId>> {
        let Some(name) = plot_name.or(self.plot_default.as_deref()) else {
            return Ok(None);
        };
        let source = match self.plots.get(name) {
            Some(plot) if plot.len() >= 2 => plot[plot.len() - 2],
            _ => return Ok(None),
        };
        self.add_edge(source)
    }

    /// Queues an edge between two points that follow each other in a plot.
    pub fn add_edge_between(&mut self, source: CellId, target: CellId) -> Result<EdgeId> {
        if self.base.point(source).is_none() || self.base.point(target).is_none() {
            return Err(GraphError::invalid(format!(
                "cell#{} and cell#{} must both be cartesian points",
                source.0, target.0
            )));
        }
        if self.base.chain_neighbours(source).1 != Some(target) {
            return Err(GraphError::invalid(
                "edges can only join sequential points of the same plot",
            ));
        }
        self.add_edge(source)?
            .ok_or_else(|| GraphError::invalid("source point has no successor"))
    }

    /// Forgets every plot as well as every node.
    pub fn clear(&mut self) {
        self.base.clear();
        self.plots.clear();
        self.plot_default = None;
    }

    fn x_of(&self, id: CellId) -> f64 {
        self.base.point(id).map_or(f64::NAN, |p| p.x())
    }
}

fn check_distinct_x(dataset: &[Point]) -> Result<()> {
    if let Some(p) = dataset.iter().find(|p| !p.x.is_finite()) {
        return Err(GraphError::invalid(format!("point x={} is not finite", p.x)));
    }
    let mut xs: Vec<f64> = dataset.iter().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    if let Some(pair) = xs.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(GraphError::invalid(format!(
            "dataset has more than one point at x={}",
            pair[0]
        )));
    }
    Ok(())
}

impl GraphModel for MultiplotModel {
    fn base(&self) -> &Model {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Model {
        &mut self.base
    }

    /// The first point of a plot has no parent and stays that way.
    fn attach_orphans_to_graph_parent(&mut self, _cells: &[CellId]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Edge;

    fn xs(model: &MultiplotModel, plot: &str) -> Vec<f64> {
        model.plot(plot).unwrap().iter().map(|id| model.x_of(*id)).collect()
    }

    fn chain_xs(model: &MultiplotModel, head: CellId) -> Vec<f64> {
        std::iter::once(head)
            .chain(model.base().cell_children(head))
            .map(|id| model.x_of(id))
            .collect()
    }

    fn pts(values: &[(f64, f64)]) -> Vec<Point> {
        values.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn plot_is_sorted_chained_and_joined() {
        let mut model = MultiplotModel::new();
        model
            .add_plot("a", &pts(&[(3.0, 1.0), (1.0, 0.0), (2.0, 5.0)]), &PointStyle::default())
            .unwrap();
        assert_eq!(xs(&model, "a"), vec![1.0, 2.0, 3.0]);
        let head = model.plot("a").unwrap()[0];
        assert_eq!(chain_xs(&model, head), vec![1.0, 2.0, 3.0]);
        assert_eq!(model.base().added_cells().len(), 3);
        assert_eq!(model.base().added_edges().len(), 2);
        assert_eq!(model.plot_default(), Some("a"));
    }

    #[test]
    fn duplicate_x_in_dataset_is_rejected_up_front() {
        let mut model = MultiplotModel::new();
        let err = model
            .add_plot("a", &pts(&[(1.0, 0.0), (1.0, 2.0)]), &PointStyle::default())
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert_eq!(model.plots_count(), 0);
        assert!(model.base().added_cells().is_empty());
    }

    #[test]
    fn replacing_a_plot_queues_old_points_for_removal() {
        let mut model = MultiplotModel::new();
        let style = PointStyle::default();
        model.add_plot("a", &pts(&[(0.0, 0.0), (1.0, 1.0)]), &style).unwrap();
        model.end_update();
        let old = model.plot("a").unwrap().to_vec();

        model.add_plot("a", &pts(&[(5.0, 0.0)]), &style).unwrap();
        assert_eq!(model.plots_count(), 1);
        assert_eq!(model.base().removed_cells(), old.as_slice());
        assert_eq!(model.base().removed_edges().len(), 1);
        model.end_update();
        assert_eq!(model.base().all_cells().len(), 1);
        assert!(model.base().all_edges().is_empty());
    }

    #[test]
    fn add_point_inserts_in_x_order() {
        let mut model = MultiplotModel::new();
        let style = PointStyle::default();
        for x in [2.0, 4.0, 0.0, 3.0, 1.0] {
            model.add_point("p", Point::new(x, x * 2.0), &style).unwrap();
        }
        assert_eq!(xs(&model, "p"), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let head = model.plot("p").unwrap()[0];
        assert_eq!(chain_xs(&model, head), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(model.base().added_edges().is_empty());

        let err = model.add_point("p", Point::new(3.0, 0.0), &style).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert_eq!(model.plot("p").unwrap().len(), 5);
    }

    #[test]
    fn edges_follow_the_chain() {
        let mut model = MultiplotModel::new();
        let style = PointStyle::default();
        let a = model.add_point("p", Point::new(0.0, 0.0), &style).unwrap();
        let b = model.add_point("p", Point::new(1.0, 0.0), &style).unwrap();
        assert!(model.add_edge(b).unwrap().is_none());
        let edge = model.add_last_edge(None).unwrap().unwrap();
        let edge = model.base().edge(edge).unwrap();
        assert_eq!((edge.source(), edge.target()), (a, b));
        assert!(!edge.links_cells());

        assert!(model.add_edge_between(b, a).is_err());
        assert!(model.add_edge_between(a, b).is_ok());
        assert!(model.add_last_edge(Some("missing")).unwrap().is_none());
    }

    #[test]
    fn joining_the_same_points_twice_reuses_the_edge() {
        let mut model = MultiplotModel::new();
        let style = PointStyle::default();
        let a = model.add_point("p", Point::new(0.0, 0.0), &style).unwrap();
        model.add_point("p", Point::new(1.0, 0.0), &style).unwrap();
        let first = model.add_edge(a).unwrap().unwrap();
        let again = model.add_edge(a).unwrap().unwrap();
        assert_eq!(first, again);
        assert_eq!(model.base().added_edges(), &[first]);

        model.end_update();
        assert_eq!(model.add_last_edge(None).unwrap(), Some(first));
        assert_eq!(model.base().all_edges(), &[first]);
        assert!(model.base().added_edges().is_empty());
    }

    #[test]
    fn remove_point_relinks_neighbours_and_drops_edges() {
        let mut model = MultiplotModel::new();
        model
            .add_plot("p", &pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]), &PointStyle::default())
            .unwrap();
        model.end_update();
        let ids = model.plot("p").unwrap().to_vec();
        model.remove_point(ids[1]).unwrap();
        assert_eq!(xs(&model, "p"), vec![0.0, 2.0]);
        assert_eq!(model.base().chain_neighbours(ids[0]).1, Some(ids[2]));
        assert_eq!(model.base().removed_edges().len(), 2);
        assert_eq!(model.base().removed_cells(), &[ids[1]]);
    }

    #[test]
    fn plain_cells_are_unsupported() {
        let mut model = MultiplotModel::new();
        let id = model.base_mut().insert_cell(crate::cells::RectangleCell::new());
        assert!(matches!(model.add_cell(id), Err(GraphError::Unsupported(_))));
        assert!(model.remove_point(id).is_err());
    }

    #[test]
    fn orphans_stay_unparented() {
        let mut model = MultiplotModel::new();
        model.add_point("p", Point::new(0.0, 0.0), &PointStyle::default()).unwrap();
        model.end_update();
        assert!(model.base().cell_children(model.base().root()).is_empty());
    }

    #[test]
    fn default_plot_must_exist() {
        let mut model = MultiplotModel::new();
        assert!(model.set_plot_default("nope").is_err());
        model.add_point("a", Point::new(0.0, 0.0), &PointStyle::default()).unwrap();
        model.add_point("b", Point::new(0.0, 0.0), &PointStyle::default()).unwrap();
        assert_eq!(model.plot_default(), Some("a"));
        model.set_plot_default("b").unwrap();
        assert_eq!(model.plot_default(), Some("b"));
        model.clear();
        assert_eq!(model.plots_count(), 0);
        assert_eq!(model.plot_default(), None);
    }
}
