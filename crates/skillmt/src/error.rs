use std::path::PathBuf;

use thiserror::Error;

/// Arguments rejected by a tool's parameter schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameters: [{}]", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("param {name} must be {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
    },

    #[error("param {name} must have at least {min} items")]
    TooFewItems { name: String, min: usize },

    #[error("param {name} must have at most {max} items")]
    TooManyItems { name: String, max: usize },
}

/// Failures raised by skill implementations, at construction or execution.
#[derive(Error, Debug)]
pub enum SkillError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("unsupported operation `{0}`")]
    UnsupportedOperation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Problems found while loading a single skill directory. These never abort
/// a registry load; the offending directory or tool is skipped.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tool definition {path}: {source}")]
    Definition {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed implementation manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no usable implementation for tool `{tool}` in {path}")]
    NoImplementation { tool: String, path: PathBuf },
}
