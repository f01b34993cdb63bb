// src/error.rs
// Structural errors: they fail the operation outright and never reach a cell's cached value.

use thiserror::Error;

use crate::position::Position;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid cell position: {0}")]
    InvalidPosition(Position),

    #[error("circular dependency would be introduced at {0}")]
    CircularDependency(Position),

    #[error("formula parse error: {0}")]
    FormulaParse(String),
}
