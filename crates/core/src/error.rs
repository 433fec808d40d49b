//! Engine construction errors

use crate::config::{ConfigError, ParameterError};
use thiserror::Error;

/// Errors that prevent an engine from becoming ready.
///
/// Forecasting problems never appear here: they degrade to the constant predictor.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The static configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A parameter override was rejected.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}
