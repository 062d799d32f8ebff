use thiserror::Error;

/// Errors raised by the graph core. Every failure is synchronous and
/// surfaces to the direct caller.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("failed to {action} {node}")]
    Attach {
        action: &'static str,
        node: String,
        #[source]
        source: Box<GraphError>,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GraphError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub(crate) fn attach(action: &'static str, node: impl std::fmt::Display, source: GraphError) -> Self {
        Self::Attach {
            action,
            node: node.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
