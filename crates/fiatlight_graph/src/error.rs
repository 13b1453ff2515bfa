//! Error types for graph edition, function invocation and persistence.

use thiserror::Error;

use crate::node::NodeId;

/// Reasons a graph edit is rejected.
///
/// Each link admission rule has its own variant; the `Display` text is the
/// human-readable reason shown to the user. A rejected edit leaves the
/// graph unchanged.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No node has this unique name.
    #[error("Function {0} not found in the graph")]
    UnknownFunction(String),

    /// No node has this id.
    #[error("Node {0} not found in the graph")]
    UnknownNode(NodeId),

    /// The source output index does not exist.
    #[error("Output index {idx} is out of range for function {function}")]
    OutputOutOfRange {
        /// Unique name of the source node.
        function: String,
        /// Requested output index.
        idx: usize,
    },

    /// The destination input does not exist.
    #[error("Input {input} not found in function {function}")]
    UnknownInput {
        /// Unique name of the destination node.
        function: String,
        /// Requested input name.
        input: String,
    },

    /// No input name was given and the destination has no input.
    #[error("Function {0} has no inputs")]
    NoInputs(String),

    /// Source and destination are the same node.
    #[error("Cannot link a function to itself")]
    SelfLink,

    /// The exact same link is already in the graph.
    #[error("Link already exists")]
    DuplicateLink,

    /// Another link already feeds this input.
    #[error("Input {input} of function {function} is already linked")]
    InputAlreadyLinked {
        /// Unique name of the destination node.
        function: String,
        /// Input name.
        input: String,
    },

    /// The link would close a cycle.
    #[error("Link would create a cycle")]
    WouldCreateCycle,

    /// The link to remove is not in the graph.
    #[error("Link not found in the graph")]
    UnknownLink,

    /// The link was added but invoking the destination failed (debug mode).
    #[error(transparent)]
    Invocation(#[from] FunctionError),
}

/// A user function failure that unwinds to the caller.
///
/// Failures are only surfaced as errors when the "catch function
/// exceptions" flag is off; otherwise they are stored on the function and
/// every output becomes `Error`.
#[derive(Debug, Clone, Error)]
pub enum FunctionError {
    /// The function returned an error.
    #[error("function `{function}` failed: {message}")]
    Failed {
        /// Function name.
        function: String,
        /// Error message.
        message: String,
    },

    /// The function panicked.
    #[error("function `{function}` panicked: {message}")]
    Panicked {
        /// Function name.
        function: String,
        /// Panic payload.
        message: String,
        /// Backtrace captured when the panic was caught.
        traceback: String,
    },
}

impl FunctionError {
    /// Name of the failing function.
    #[must_use]
    pub fn function(&self) -> &str {
        match self {
            Self::Failed { function, .. } | Self::Panicked { function, .. } => function,
        }
    }
}

/// Errors while reading or writing persisted documents.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A state file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File path.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A document is not valid JSON, or does not have the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A document has the right syntax but unexpected content.
    #[error("malformed {document} document: {reason}")]
    Malformed {
        /// Which document.
        document: &'static str,
        /// What is wrong.
        reason: String,
    },
}

impl PersistenceError {
    /// Creates a [`PersistenceError::Io`].
    pub fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a [`PersistenceError::Malformed`].
    pub fn malformed(document: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            document,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_reasons_are_readable() {
        assert_eq!(GraphError::WouldCreateCycle.to_string(), "Link would create a cycle");
        assert_eq!(GraphError::DuplicateLink.to_string(), "Link already exists");
        let err = GraphError::InputAlreadyLinked {
            function: "mul2".into(),
            input: "a".into(),
        };
        assert_eq!(err.to_string(), "Input a of function mul2 is already linked");
    }

    #[test]
    fn function_errors_name_the_function() {
        let err = FunctionError::Failed {
            function: "div".into(),
            message: "division by zero".into(),
        };
        assert_eq!(err.function(), "div");
        assert_eq!(err.to_string(), "function `div` failed: division by zero");

        let wrapped: GraphError = err.into();
        assert!(matches!(wrapped, GraphError::Invocation(_)));
    }
}
