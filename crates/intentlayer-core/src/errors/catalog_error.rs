/// Template catalog loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid {kind} definition '{name}': {reason}")]
    InvalidDefinition {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: String, name: String },
}
