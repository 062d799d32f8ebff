use super::actor::ActorCell;
use super::message::MessageEdge;
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::model::Model;
use crate::node::{CellId, EdgeId};
use crate::property::Property;
use tracing::debug;

pub const DEFAULT_ACTOR_SPACING: f64 = 200.0;
pub const DEFAULT_MESSAGE_SPACING: f64 = 50.0;

/// A graph laid out as a sequence diagram. Actors are placed left to right
/// in the order they were added and messages top to bottom. Every
/// operation commits right away; [`SequenceDiagram::layout`] places the
/// nodes.
pub struct SequenceDiagram {
    graph: Graph<Model>,
    actors: Vec<CellId>,
    messages: Vec<(EdgeId, Property<f64>)>,
    actor_spacing: f64,
    message_spacing: f64,
}

impl SequenceDiagram {
    pub fn new() -> Self {
        Self::from_graph(Graph::new())
    }

    pub fn with_config(config: GraphConfig) -> Result<Self> {
        Ok(Self::from_graph(Graph::with_config(Model::new(), config)?))
    }

    fn from_graph(graph: Graph<Model>) -> Self {
        Self {
            graph,
            actors: Vec::new(),
            messages: Vec::new(),
            actor_spacing: DEFAULT_ACTOR_SPACING,
            message_spacing: DEFAULT_MESSAGE_SPACING,
        }
    }

    pub fn graph(&self) -> &Graph<Model> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph<Model> {
        &mut self.graph
    }

    pub fn actors(&self) -> &[CellId] {
        &self.actors
    }

    pub fn messages(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.messages.iter().map(|(id, _)| *id)
    }

    pub fn actor_spacing(&self) -> f64 {
        self.actor_spacing
    }

    /// Horizontal distance between neighbouring actors. Applied on the
    /// next [`SequenceDiagram::layout`].
    pub fn set_actor_spacing(&mut self, spacing: f64) -> Result<()> {
        self.actor_spacing = check_spacing(spacing)?;
        Ok(())
    }

    pub fn message_spacing(&self) -> f64 {
        self.message_spacing
    }

    /// Vertical distance between consecutive messages.
    pub fn set_message_spacing(&mut self, spacing: f64) -> Result<()> {
        self.message_spacing = check_spacing(spacing)?;
        Ok(())
    }

    /// Adds an actor whose lifeline is `length` long.
    pub fn add_actor(&mut self, name: &str, length: f64) -> Result<CellId> {
        if !length.is_finite() || length < 0.0 {
            return Err(GraphError::invalid(format!(
                "lifeline length {length} must be finite and not negative"
            )));
        }
        let id = self.graph.model_mut().insert_cell(ActorCell::new(name, length));
        self.graph.begin_update();
        self.graph.model_mut().add_cell(id)?;
        self.graph.end_update()?;
        self.actors.push(id);
        debug!(actor = name, cell = id.0, "added actor");
        Ok(id)
    }

    /// Adds a message below every earlier one. Both ends must be actors of
    /// this diagram.
    pub fn add_message(&mut self, source: CellId, target: CellId, name: &str) -> Result<EdgeId> {
        for end in [source, target] {
            if !self.actors.contains(&end) {
                return Err(GraphError::invalid(format!(
                    "cell#{} is not an actor of this diagram",
                    end.0
                )));
            }
        }
        let message = MessageEdge::new(source, target, name);
        let offset = message.y_offset().clone();
        offset.set((self.messages.len() + 1) as f64 * self.message_spacing);
        let id = self.graph.model_mut().insert_edge(message)?;
        self.graph.begin_update();
        self.graph.model_mut().add_edge(id)?;
        self.graph.end_update()?;
        self.messages.push((id, offset));
        debug!(message = name, edge = id.0, "added message");
        Ok(id)
    }

    /// Places actor `i` at `(i * actor_spacing, 0)` and gives message `k`
    /// (counting from one) the offset `k * message_spacing`.
    pub fn layout(&mut self) -> Result<()> {
        for (i, &actor) in self.actors.iter().enumerate() {
            let graphic = self.graph.get_graphic(actor)?;
            graphic.set_layout(i as f64 * self.actor_spacing, 0.0);
        }
        for (k, (_, offset)) in self.messages.iter().enumerate() {
            offset.set((k + 1) as f64 * self.message_spacing);
        }
        debug!(
            actors = self.actors.len(),
            messages = self.messages.len(),
            "laid out sequence diagram"
        );
        Ok(())
    }
}

impl Default for SequenceDiagram {
    fn default() -> Self {
        Self::new()
    }
}

fn check_spacing(spacing: f64) -> Result<f64> {
    if spacing.is_finite() && spacing >= 0.0 {
        Ok(spacing)
    } else {
        Err(GraphError::invalid(format!(
            "spacing {spacing} must be finite and not negative"
        )))
    }
}
