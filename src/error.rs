//! Error types for topology construction, allocation and serialization.

/// Errors raised while building, allocating or (de)serializing a network.
///
/// The variants fall into three groups: configuration errors (caught before
/// the graph is touched), allocation exhaustion (rejection sampling ran out
/// of attempts) and serialization errors (a persisted map that cannot be
/// turned back into a consistent network).
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Invalid server count {0}: a network needs at least one server")]
    InvalidServerCount(usize),

    #[error("Cannot attach {0} to an empty network")]
    EmptyNetwork(String),

    #[error("No server with free hub capacity to anchor a new core hub")]
    NoBackboneAnchor,

    #[error("Unknown node index {0}")]
    UnknownNode(usize),

    #[error("Cannot link a server to itself (node {0})")]
    SelfLink(usize),

    #[error("Servers {0} and {1} are already linked")]
    DuplicateLink(String, String),

    #[error("Could not allocate a unique {kind} after {attempts} attempts")]
    AllocationExhausted { kind: &'static str, attempts: usize },

    #[error("Invalid SID '{0}': expected two digits followed by an uppercase letter")]
    InvalidSid(String),

    #[error("Server {0} has no SID assigned")]
    MissingSid(usize),

    #[error("Server {sid}: {reason}")]
    InvalidRole { sid: String, reason: String },

    #[error("Link references unknown SID '{0}'")]
    UnknownSid(String),

    #[error("Malformed link entry: {0}")]
    MalformedLink(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
