//! Error types for Lantern.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LanternError {
    /// A named capability call failed. Recoverable: the affected unit of
    /// work is skipped, sibling work continues.
    #[error("Capability error: {0}")]
    Capability(String),

    /// Lookup of a capability name that was never registered.
    #[error("Capability '{0}' is not registered")]
    UnknownCapability(String),

    /// Registration of a capability name that is already taken. Duplicate
    /// registration is rejected rather than shadowing the earlier entry.
    #[error("Capability '{0}' is already registered")]
    DuplicateCapability(String),

    /// A text-completion call failed at the transport or provider level.
    #[error("Completion error: {0}")]
    Completion(String),

    /// An entire pipeline stage could not produce output. Fatal to the run.
    #[error("Stage error: {0}")]
    Stage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LanternError>;
