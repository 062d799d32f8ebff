//! The authoritative set of cells and edges.
//!
//! Nodes are registered once in an arena and addressed by [`CellId`] /
//! [`EdgeId`]. Registration never frees a slot, so a removed node keeps its
//! identity. Adds and removes are queued and only reach the live set in
//! [`Model::merge`].

use crate::cartesian::CartesianPoint;
use crate::edges::LineEdge;
use crate::error::{GraphError, Result};
use crate::node::{Cell, CellId, Edge, EdgeId, NodeId, NodeRef, RootCell};
use std::any::Any;
use std::rc::Rc;
use tracing::{debug, trace};

/// Parent/child links of one cell.
#[derive(Debug)]
enum Links {
    /// General cells: many parents, many children.
    Tree { children: Vec<CellId>, parents: Vec<CellId> },
    /// Cartesian points: a strictly x-ordered doubly linked chain.
    Chain {
        point: Rc<CartesianPoint>,
        lesser: Option<CellId>,
        greater: Option<CellId>,
    },
}

#[derive(Debug)]
struct CellSlot {
    cell: Rc<dyn Cell>,
    links: Links,
}

#[derive(Debug)]
pub struct Model {
    root: CellId,
    cells: Vec<CellSlot>,
    edges: Vec<Rc<dyn Edge>>,
    all_cells: Vec<CellId>,
    added_cells: Vec<CellId>,
    removed_cells: Vec<CellId>,
    all_edges: Vec<EdgeId>,
    added_edges: Vec<EdgeId>,
    removed_edges: Vec<EdgeId>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        let root = CellSlot {
            cell: Rc::new(RootCell),
            links: Links::Tree {
                children: Vec::new(),
                parents: Vec::new(),
            },
        };
        Self {
            root: CellId(0),
            cells: vec![root],
            edges: Vec::new(),
            all_cells: Vec::new(),
            added_cells: Vec::new(),
            removed_cells: Vec::new(),
            all_edges: Vec::new(),
            added_edges: Vec::new(),
            removed_edges: Vec::new(),
        }
    }

    pub fn root(&self) -> CellId {
        self.root
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Registers a cell without queueing it. Cartesian points join the
    /// x-ordered chain links; every other cell gets tree links.
    pub fn insert_cell<C: Cell + 'static>(&mut self, cell: C) -> CellId {
        let cell = Rc::new(cell);
        let any: Rc<dyn Any> = cell.clone();
        match any.downcast::<CartesianPoint>() {
            Ok(point) => self.push_cell(point.clone(), Some(point)),
            Err(_) => self.push_cell(cell, None),
        }
    }

    fn push_cell(&mut self, cell: Rc<dyn Cell>, point: Option<Rc<CartesianPoint>>) -> CellId {
        let links = match point {
            Some(point) => Links::Chain {
                point,
                lesser: None,
                greater: None,
            },
            None => Links::Tree {
                children: Vec::new(),
                parents: Vec::new(),
            },
        };
        let id = CellId(self.cells.len());
        self.cells.push(CellSlot { cell, links });
        trace!(cell = id.0, "registered cell");
        id
    }

    /// Registers an edge. A linking edge makes its source a child of its
    /// target right away.
    pub fn insert_edge(&mut self, edge: impl Edge + 'static) -> Result<EdgeId> {
        self.push_edge(Rc::new(edge))
    }

    pub(crate) fn push_edge(&mut self, edge: Rc<dyn Edge>) -> Result<EdgeId> {
        let (source, target) = (edge.source(), edge.target());
        self.check_cell(source, "edge source")?;
        self.check_cell(target, "edge target")?;
        if edge.links_cells() {
            if source == target {
                return Err(GraphError::invalid(format!(
                    "linking edge would make cell#{} its own parent",
                    source.0
                )));
            }
            self.add_cell_parent(source, target)?;
        }
        let id = EdgeId(self.edges.len());
        self.edges.push(edge);
        trace!(edge = id.0, source = source.0, target = target.0, "registered edge");
        Ok(id)
    }

    /// Registers a linking line edge between two cells and queues it.
    pub fn connect(&mut self, source: CellId, target: CellId, directed: bool) -> Result<EdgeId> {
        let id = self.insert_edge(LineEdge::new(source, target, directed))?;
        self.add_edge(id)?;
        Ok(id)
    }

    fn check_cell(&self, id: CellId, what: &str) -> Result<()> {
        if id.0 < self.cells.len() {
            Ok(())
        } else {
            Err(GraphError::invalid(format!("{what} cell#{} is not registered", id.0)))
        }
    }

    fn check_edge(&self, id: EdgeId) -> Result<()> {
        if id.0 < self.edges.len() {
            Ok(())
        } else {
            Err(GraphError::invalid(format!("edge#{} is not registered", id.0)))
        }
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    pub fn cell(&self, id: CellId) -> Option<Rc<dyn Cell>> {
        self.cells.get(id.0).map(|slot| Rc::clone(&slot.cell))
    }

    pub fn edge(&self, id: EdgeId) -> Option<Rc<dyn Edge>> {
        self.edges.get(id.0).map(Rc::clone)
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef> {
        match id {
            NodeId::Cell(id) => self.cell(id).map(NodeRef::Cell),
            NodeId::Edge(id) => self.edge(id).map(NodeRef::Edge),
        }
    }

    pub fn point(&self, id: CellId) -> Option<Rc<CartesianPoint>> {
        match self.cells.get(id.0).map(|slot| &slot.links) {
            Some(Links::Chain { point, .. }) => Some(Rc::clone(point)),
            _ => None,
        }
    }

    pub fn all_cells(&self) -> &[CellId] {
        &self.all_cells
    }

    pub fn added_cells(&self) -> &[CellId] {
        &self.added_cells
    }

    pub fn removed_cells(&self) -> &[CellId] {
        &self.removed_cells
    }

    pub fn all_edges(&self) -> &[EdgeId] {
        &self.all_edges
    }

    pub fn added_edges(&self) -> &[EdgeId] {
        &self.added_edges
    }

    pub fn removed_edges(&self) -> &[EdgeId] {
        &self.removed_edges
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        match id {
            NodeId::Cell(id) => self.all_cells.contains(&id),
            NodeId::Edge(id) => self.all_edges.contains(&id),
        }
    }

    /// Live or pending-added edges that start or end at `cell`.
    pub fn edges_touching(&self, cell: CellId) -> Vec<EdgeId> {
        self.all_edges
            .iter()
            .chain(self.added_edges.iter())
            .copied()
            .filter(|id| {
                let edge = &self.edges[id.0];
                edge.source() == cell || edge.target() == cell
            })
            .collect()
    }

    // ── Pending changes ─────────────────────────────────────────────────

    pub fn add_cell(&mut self, id: CellId) -> Result<()> {
        self.check_cell(id, "added")?;
        if id == self.root {
            return Err(GraphError::invalid("the root cell cannot be added"));
        }
        let live = self.all_cells.contains(&id);
        queue_add(id, live, &mut self.added_cells, &mut self.removed_cells);
        Ok(())
    }

    pub fn remove_cell(&mut self, id: CellId) -> Result<()> {
        self.check_cell(id, "removed")?;
        queue_remove(id, &mut self.added_cells, &mut self.removed_cells);
        Ok(())
    }

    pub fn add_edge(&mut self, id: EdgeId) -> Result<()> {
        self.check_edge(id)?;
        let live = self.all_edges.contains(&id);
        queue_add(id, live, &mut self.added_edges, &mut self.removed_edges);
        Ok(())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        self.check_edge(id)?;
        queue_remove(id, &mut self.added_edges, &mut self.removed_edges);
        Ok(())
    }

    // ── Links ───────────────────────────────────────────────────────────

    /// Makes `child` a child of `parent`. Chained points insert by x order
    /// and reject candidates that would break it.
    pub fn add_cell_child(&mut self, parent: CellId, child: CellId) -> Result<()> {
        self.check_cell(parent, "parent")?;
        self.check_cell(child, "child")?;
        match (self.is_chained(parent), self.is_chained(child)) {
            (true, true) => self.chain_insert(parent, child),
            (true, false) => Err(GraphError::invalid(format!(
                "cell#{} only accepts cartesian points as children",
                parent.0
            ))),
            (false, true) => Err(GraphError::invalid(format!(
                "cartesian point cell#{} only accepts cartesian points as parents",
                child.0
            ))),
            (false, false) => {
                self.link_tree(parent, child);
                Ok(())
            }
        }
    }

    /// Makes `parent` a parent of `cell`. For chained points this walks
    /// towards lower x until a predecessor is found.
    pub fn add_cell_parent(&mut self, cell: CellId, parent: CellId) -> Result<()> {
        self.check_cell(cell, "child")?;
        self.check_cell(parent, "parent")?;
        if !self.is_chained(cell) {
            return self.add_cell_child(parent, cell);
        }
        if !self.is_chained(parent) {
            return Err(GraphError::invalid(format!(
                "cell#{} only accepts cartesian points as parents",
                cell.0
            )));
        }
        let x = self.chain_x(cell);
        let mut candidate = parent;
        loop {
            if self.chain_x(candidate) < x {
                return self.chain_insert(candidate, cell);
            }
            match self.chain_neighbours(candidate).0 {
                Some(lesser) => candidate = lesser,
                None => return self.chain_insert(cell, candidate),
            }
        }
    }

    /// Removes `child` from `parent`'s children. For chained points the
    /// child may sit anywhere after `parent`; its neighbours are relinked.
    pub fn remove_cell_child(&mut self, parent: CellId, child: CellId) -> Result<bool> {
        self.check_cell(parent, "parent")?;
        self.check_cell(child, "child")?;
        if self.is_chained(parent) {
            if !self.is_chained(child) {
                return Ok(false);
            }
            let target_x = self.chain_x(child);
            let mut current = self.chain_neighbours(parent).1;
            while let Some(next) = current {
                if next == child {
                    self.unlink_point(child);
                    return Ok(true);
                }
                if target_x <= self.chain_x(next) {
                    break;
                }
                current = self.chain_neighbours(next).1;
            }
            return Ok(false);
        }
        let mut removed = false;
        if let Links::Tree { children, .. } = &mut self.cells[parent.0].links {
            let before = children.len();
            children.retain(|c| *c != child);
            removed = children.len() != before;
        }
        if let Links::Tree { parents, .. } = &mut self.cells[child.0].links {
            parents.retain(|p| *p != parent);
        }
        Ok(removed)
    }

    /// Children of a cell. For chained points, every point after it.
    pub fn cell_children(&self, id: CellId) -> Vec<CellId> {
        match self.cells.get(id.0).map(|slot| &slot.links) {
            Some(Links::Tree { children, .. }) => children.clone(),
            Some(Links::Chain { .. }) => self.walk_chain(id, |links| links.1),
            None => Vec::new(),
        }
    }

    /// Parents of a cell. For chained points, every point before it,
    /// closest first.
    pub fn cell_parents(&self, id: CellId) -> Vec<CellId> {
        match self.cells.get(id.0).map(|slot| &slot.links) {
            Some(Links::Tree { parents, .. }) => parents.clone(),
            Some(Links::Chain { .. }) => self.walk_chain(id, |links| links.0),
            None => Vec::new(),
        }
    }

    /// Immediate predecessor and successor of a chained point.
    pub fn chain_neighbours(&self, id: CellId) -> (Option<CellId>, Option<CellId>) {
        match self.cells.get(id.0).map(|slot| &slot.links) {
            Some(Links::Chain { lesser, greater, .. }) => (*lesser, *greater),
            _ => (None, None),
        }
    }

    fn walk_chain(
        &self,
        from: CellId,
        step: impl Fn((Option<CellId>, Option<CellId>)) -> Option<CellId>,
    ) -> Vec<CellId> {
        let mut out = Vec::new();
        let mut current = step(self.chain_neighbours(from));
        while let Some(id) = current {
            out.push(id);
            current = step(self.chain_neighbours(id));
        }
        out
    }

    fn is_chained(&self, id: CellId) -> bool {
        matches!(self.cells[id.0].links, Links::Chain { .. })
    }

    fn chain_x(&self, id: CellId) -> f64 {
        match &self.cells[id.0].links {
            Links::Chain { point, .. } => point.x(),
            Links::Tree { .. } => f64::NAN,
        }
    }

    fn set_lesser(&mut self, id: CellId, value: Option<CellId>) {
        if let Links::Chain { lesser, .. } = &mut self.cells[id.0].links {
            *lesser = value;
        }
    }

    fn set_greater(&mut self, id: CellId, value: Option<CellId>) {
        if let Links::Chain { greater, .. } = &mut self.cells[id.0].links {
            *greater = value;
        }
    }

    fn link_tree(&mut self, parent: CellId, child: CellId) {
        if let Links::Tree { children, .. } = &mut self.cells[parent.0].links {
            if !children.contains(&child) {
                children.push(child);
            }
        }
        if let Links::Tree { parents, .. } = &mut self.cells[child.0].links {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
    }

    /// Inserts `candidate` after `start`, descending the chain to the
    /// position its x value requires. Nothing changes on rejection.
    fn chain_insert(&mut self, start: CellId, candidate: CellId) -> Result<()> {
        let x = self.chain_x(candidate);
        let (candidate_lesser, candidate_greater) = self.chain_neighbours(candidate);
        if candidate == start || candidate_lesser.is_some() {
            return Err(GraphError::invalid(format!(
                "point cell#{} already has a predecessor",
                candidate.0
            )));
        }
        if x <= self.chain_x(start) {
            return Err(GraphError::invalid(format!(
                "point x={x} is not greater than x={}",
                self.chain_x(start)
            )));
        }
        let mut current = start;
        loop {
            let Some(next) = self.chain_neighbours(current).1 else {
                if candidate_greater.is_some() {
                    debug!(tail = current.0, head = candidate.0, "appending a whole chain");
                }
                self.set_greater(current, Some(candidate));
                self.set_lesser(candidate, Some(current));
                return Ok(());
            };
            let next_x = self.chain_x(next);
            if x == next_x {
                return Err(GraphError::invalid(format!("a point with x={x} is already chained")));
            }
            if x < next_x {
                if candidate_greater.is_some() {
                    return Err(GraphError::invalid(format!(
                        "point cell#{} cannot be spliced while it has a successor",
                        candidate.0
                    )));
                }
                self.set_greater(current, Some(candidate));
                self.set_lesser(candidate, Some(current));
                self.set_greater(candidate, Some(next));
                self.set_lesser(next, Some(candidate));
                return Ok(());
            }
            current = next;
        }
    }

    /// Takes a point out of its chain and joins its neighbours.
    pub(crate) fn unlink_point(&mut self, id: CellId) {
        let (lesser, greater) = self.chain_neighbours(id);
        if let Some(lesser) = lesser {
            self.set_greater(lesser, greater);
        }
        if let Some(greater) = greater {
            self.set_lesser(greater, lesser);
        }
        self.set_lesser(id, None);
        self.set_greater(id, None);
    }

    // ── Commit ──────────────────────────────────────────────────────────

    /// Parents every tree cell without parents to the root.
    pub fn attach_orphans_to_graph_parent(&mut self, cells: &[CellId]) {
        for &cell in cells {
            let orphan = matches!(&self.cells[cell.0].links, Links::Tree { parents, .. } if parents.is_empty());
            if orphan && cell != self.root {
                trace!(cell = cell.0, "attaching orphan to root");
                self.link_tree(self.root, cell);
            }
        }
    }

    pub fn disconnect_from_graph_parent(&mut self, cells: &[CellId]) {
        let root = self.root;
        for &cell in cells {
            if let Links::Tree { children, .. } = &mut self.cells[root.0].links {
                children.retain(|c| *c != cell);
            }
            if let Links::Tree { parents, .. } = &mut self.cells[cell.0].links {
                parents.retain(|p| *p != root);
            }
        }
    }

    pub fn end_update(&mut self) {
        let added = self.added_cells.clone();
        let removed = self.removed_cells.clone();
        self.attach_orphans_to_graph_parent(&added);
        self.disconnect_from_graph_parent(&removed);
        self.merge();
    }

    /// Applies pending adds and removes to the live sets.
    pub fn merge(&mut self) {
        debug!(
            added_cells = self.added_cells.len(),
            removed_cells = self.removed_cells.len(),
            added_edges = self.added_edges.len(),
            removed_edges = self.removed_edges.len(),
            "merging model changes"
        );
        self.all_cells.append(&mut self.added_cells);
        let removed = std::mem::take(&mut self.removed_cells);
        self.all_cells.retain(|c| !removed.contains(c));

        self.all_edges.append(&mut self.added_edges);
        let removed = std::mem::take(&mut self.removed_edges);
        self.all_edges.retain(|e| !removed.contains(e));
    }

    /// Forgets every live and pending node and every root link.
    pub fn clear(&mut self) {
        let root_children = self.cell_children(self.root);
        self.disconnect_from_graph_parent(&root_children);
        self.all_cells.clear();
        self.added_cells.clear();
        self.removed_cells.clear();
        self.all_edges.clear();
        self.added_edges.clear();
        self.removed_edges.clear();
    }
}

fn queue_add<T: PartialEq + Copy + std::fmt::Debug>(id: T, live: bool, added: &mut Vec<T>, removed: &mut Vec<T>) {
    if let Some(index) = removed.iter().position(|r| *r == id) {
        removed.remove(index);
        debug!(?id, "add cancels pending removal");
        if live {
            return;
        }
    }
    if live || added.contains(&id) {
        debug!(?id, "ignoring duplicate add");
        return;
    }
    added.push(id);
}

fn queue_remove<T: PartialEq + Copy + std::fmt::Debug>(id: T, added: &mut Vec<T>, removed: &mut Vec<T>) {
    if let Some(index) = added.iter().position(|a| *a == id) {
        added.remove(index);
        debug!(?id, "remove cancels pending add");
        return;
    }
    if !removed.contains(&id) {
        removed.push(id);
    }
}

/// How a graph drives its model through a commit.
pub trait GraphModel {
    fn base(&self) -> &Model;

    fn base_mut(&mut self) -> &mut Model;

    fn attach_orphans_to_graph_parent(&mut self, cells: &[CellId]) {
        self.base_mut().attach_orphans_to_graph_parent(cells);
    }

    fn end_update(&mut self) {
        let added = self.base().added_cells().to_vec();
        let removed = self.base().removed_cells().to_vec();
        self.attach_orphans_to_graph_parent(&added);
        self.base_mut().disconnect_from_graph_parent(&removed);
        self.base_mut().merge();
    }
}

impl GraphModel for Model {
    fn base(&self) -> &Model {
        self
    }

    fn base_mut(&mut self) -> &mut Model {
        self
    }
}
