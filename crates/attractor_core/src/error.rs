use thiserror::Error;

use crate::registry::SystemId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChaosError {
    #[error("Unknown parameter '{name}' for {system}.")]
    UnknownParameter { system: &'static str, name: String },
    #[error("State dimension mismatch. Expected {expected}, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("No system registered under id {0}.")]
    UnknownSystem(SystemId),
    #[error("Unknown system kind '{0}'.")]
    UnknownSystemKind(String),
}
