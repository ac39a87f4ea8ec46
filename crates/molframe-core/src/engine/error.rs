use thiserror::Error;

use super::config::ConfigError;
use crate::core::math::NumericError;
use crate::core::model::ModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Numeric failure: {source}")]
    Numeric {
        #[from]
        source: NumericError,
    },

    #[error("Expected a structure built from exactly one model, found {0}")]
    NotSingleModel(usize),

    #[error("Unit {0} not found in structure")]
    UnknownUnit(u32),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
