use super::Layout;
use crate::error::Result;
use crate::graph::Graph;
use crate::model::{GraphModel, Model};
use crate::node::CellId;
use std::collections::{HashMap, HashSet};

/// Top-down tree placement starting at the model's root. Each parent is
/// centred over its children; cells reachable along more than one path
/// are placed once, under the first parent that reaches them.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    level_gap: f64,
    node_gap: f64,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self::new(100.0, 45.0)
    }
}

#[derive(Debug, Default)]
struct Tree {
    children: HashMap<CellId, Vec<CellId>>,
    depth: HashMap<CellId, usize>,
    size: HashMap<CellId, (f64, f64)>,
    span: HashMap<CellId, f64>,
}

impl TreeLayout {
    pub fn new(level_gap: f64, node_gap: f64) -> Self {
        Self { level_gap, node_gap }
    }

    fn span(&self, tree: &mut Tree, node: CellId) -> f64 {
        let children = tree.children.get(&node).cloned().unwrap_or_default();
        let own = tree.size.get(&node).map_or(0.0, |s| s.0);
        let mut total = 0.0;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                total += self.node_gap;
            }
            total += self.span(tree, *child);
        }
        let span = own.max(total);
        tree.span.insert(node, span);
        span
    }

    fn place(&self, tree: &Tree, node: CellId, left: f64, level_y: &[f64], out: &mut Vec<(CellId, f64, f64)>) {
        let span = tree.span.get(&node).copied().unwrap_or(0.0);
        let (width, _) = tree.size.get(&node).copied().unwrap_or((0.0, 0.0));
        let depth = tree.depth.get(&node).copied().unwrap_or(0);
        out.push((node, left + (span - width) / 2.0, level_y.get(depth).copied().unwrap_or(0.0)));

        let children = tree.children.get(&node).map(Vec::as_slice).unwrap_or_default();
        let total: f64 = children
            .iter()
            .map(|c| tree.span.get(c).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.node_gap * children.len().saturating_sub(1) as f64;
        let mut x = left + (span - total) / 2.0;
        for child in children {
            self.place(tree, *child, x, level_y, out);
            x += tree.span.get(child).copied().unwrap_or(0.0) + self.node_gap;
        }
    }
}

fn collect(model: &Model, node: CellId, depth: usize, visited: &mut HashSet<CellId>, tree: &mut Tree) {
    for child in model.cell_children(node) {
        if visited.insert(child) {
            tree.children.entry(node).or_default().push(child);
            tree.depth.insert(child, depth + 1);
            collect(model, child, depth + 1, visited, tree);
        }
    }
}

impl Layout for TreeLayout {
    fn execute<M: GraphModel>(&mut self, graph: &mut Graph<M>) -> Result<()> {
        let model = graph.model().base();
        let root = model.root();
        let mut tree = Tree::default();
        let mut visited = HashSet::from([root]);
        collect(model, root, 0, &mut visited, &mut tree);
        tree.depth.insert(root, 0);

        let cells: Vec<CellId> = tree.depth.keys().copied().filter(|c| *c != root).collect();
        let mut levels: Vec<f64> = Vec::new();
        for cell in cells {
            let bounds = graph.get_graphic(cell)?.bounds_in_local();
            let depth = tree.depth[&cell];
            if levels.len() < depth {
                levels.resize(depth, 0.0);
            }
            levels[depth - 1] = levels[depth - 1].max(bounds.height);
            tree.size.insert(cell, (bounds.width, bounds.height));
        }

        let mut level_y = vec![0.0; levels.len() + 1];
        for depth in 1..levels.len() {
            level_y[depth + 1] = level_y[depth] + levels[depth - 1] + self.level_gap;
        }

        self.span(&mut tree, root);
        let mut placed = Vec::new();
        self.place(&tree, root, 0.0, &level_y, &mut placed);
        for (cell, x, y) in placed.into_iter().filter(|(c, ..)| *c != root) {
            if let Some(graphic) = graph.graphic(cell) {
                graphic.relocate(x, y);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::RectangleCell;
    use crate::geometry::Rect;

    #[test]
    fn parent_is_centred_over_children() {
        let mut graph = Graph::new();
        let model = graph.model_mut();
        let top = model.insert_cell(RectangleCell::fixed(50.0, 50.0));
        let left = model.insert_cell(RectangleCell::fixed(50.0, 50.0));
        let right = model.insert_cell(RectangleCell::fixed(50.0, 50.0));
        for id in [top, left, right] {
            model.add_cell(id).unwrap();
        }
        model.connect(left, top, true).unwrap();
        model.connect(right, top, true).unwrap();
        graph.end_update().unwrap();

        graph.layout(&mut TreeLayout::default()).unwrap();
        let at = |id: CellId| graph.graphic(id).unwrap().bounds_in_parent();
        assert_eq!(at(top), Rect::new(47.5, 0.0, 50.0, 50.0));
        assert_eq!(at(left), Rect::new(0.0, 150.0, 50.0, 50.0));
        assert_eq!(at(right), Rect::new(95.0, 150.0, 50.0, 50.0));
    }

    #[test]
    fn shared_child_is_placed_once() {
        let mut graph = Graph::new();
        let model = graph.model_mut();
        let a = model.insert_cell(RectangleCell::fixed(20.0, 20.0));
        let b = model.insert_cell(RectangleCell::fixed(20.0, 20.0));
        let c = model.insert_cell(RectangleCell::fixed(20.0, 20.0));
        for id in [a, b, c] {
            model.add_cell(id).unwrap();
        }
        model.connect(c, a, false).unwrap();
        model.connect(c, b, false).unwrap();
        graph.end_update().unwrap();

        graph.layout(&mut TreeLayout::new(10.0, 10.0)).unwrap();
        let c_box = graph.graphic(c).unwrap().bounds_in_parent();
        assert_eq!(c_box.y, 30.0);
        let a_box = graph.graphic(a).unwrap().bounds_in_parent();
        let b_box = graph.graphic(b).unwrap().bounds_in_parent();
        assert_eq!((a_box.y, b_box.y), (0.0, 0.0));
        assert_eq!(b_box.x - a_box.x, 30.0);
    }
}
