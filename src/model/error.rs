use thiserror::Error;

/// Errors raised while building or transforming the declared-state model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Malformed version: {0:?}")]
    MalformedVersion(String),

    #[error("Unresolved placeholder ${{{placeholder}}} in property {key}")]
    UnresolvedPlaceholder { key: String, placeholder: String },

    #[error("Distribution {artifact_id} {version} is not supported (oldest supported is {minimum})")]
    UnsupportedDistributionVersion {
        artifact_id: String,
        version: String,
        minimum: String,
    },

    #[error("Invalid artifact specification: {0}")]
    InvalidArtifactSpec(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid line {line_number}: {line:?}")]
    InvalidLine { line_number: usize, line: String },

    #[error("No version available: {0}")]
    NoVersionAvailable(String),

    #[error("Conflicting parent distribution declaration: {0}")]
    ConflictingParentDeclaration(String),
}
