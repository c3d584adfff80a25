use thiserror::Error;

use super::calculation::CalculationError;
use super::selection::SelectionError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Result has not been calculated")]
    NotInitialized,

    #[error("Atom index {index} out of range (result has {len} atoms)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Surface calculation failed: {source}")]
    Calculation {
        #[from]
        source: CalculationError,
    },

    #[error("Calculator returned {actual} areas for {expected} atoms")]
    AtomCountMismatch { expected: usize, actual: usize },

    #[error("Structure has {actual} atoms but the result was calculated for {expected}")]
    StructureMismatch { expected: usize, actual: usize },

    #[error("Expected 3 coordinates per radius, got {coords} coordinates for {radii} radii")]
    InvalidCoordinates { coords: usize, radii: usize },

    #[error("Malformed selection '{expression}': {reason}")]
    SelectionSyntax { expression: String, reason: String },

    #[error("Selection '{expression}' could not be evaluated: {source}")]
    Selection {
        expression: String,
        source: SelectionError,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
