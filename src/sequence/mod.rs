//! Sequence diagrams: actors side by side, each with a lifeline, and
//! messages drawn as arrows between lifelines, one row per message.

mod actor;
mod diagram;
mod message;

pub use actor::ActorCell;
pub use diagram::SequenceDiagram;
pub use message::MessageEdge;
