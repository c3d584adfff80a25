use super::classify::SelectionAreas;
use super::error::EngineError;
use super::result::SasaResult;
use crate::core::models::structure::Structure;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("{0}")]
    Evaluation(String),
}

/// Evaluates selection predicates (residue names, residue number ranges, chains,
/// elements and their boolean combinations) to a total area.
pub trait SelectionEngine {
    fn evaluate(
        &self,
        predicate: &str,
        structure: &Structure,
        result: &SasaResult,
    ) -> Result<f64, SelectionError>;
}

fn split_selection(expression: &str) -> Result<(&str, &str), EngineError> {
    let syntax = |reason: &str| EngineError::SelectionSyntax {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };
    let (name, predicate) = expression
        .split_once(',')
        .ok_or_else(|| syntax("expected '<name>, <predicate>'"))?;
    let (name, predicate) = (name.trim(), predicate.trim());
    if name.is_empty() {
        return Err(syntax("selection name is empty"));
    }
    if predicate.is_empty() {
        return Err(syntax("selection predicate is empty"));
    }
    Ok((name, predicate))
}

/// Evaluates each `"<name>, <predicate>"` expression and collects the areas by name.
///
/// `structure` must have as many atoms as the structure `result` was calculated for.
/// Stops at the first expression that is malformed or fails to evaluate.
pub fn select_area<S: AsRef<str>>(
    selections: &[S],
    structure: &Structure,
    result: &SasaResult,
    engine: &dyn SelectionEngine,
) -> Result<SelectionAreas, EngineError> {
    let expected = result.structure()?.n_atoms();
    if structure.n_atoms() != expected {
        return Err(EngineError::StructureMismatch {
            expected,
            actual: structure.n_atoms(),
        });
    }

    let mut areas = SelectionAreas::new();
    for selection in selections {
        let expression = selection.as_ref();
        let (name, predicate) = split_selection(expression)?;
        let area = engine
            .evaluate(predicate, structure, result)
            .map_err(|e| match e {
                SelectionError::Syntax(reason) => EngineError::SelectionSyntax {
                    expression: expression.to_string(),
                    reason,
                },
                source => EngineError::Selection {
                    expression: expression.to_string(),
                    source,
                },
            })?;
        debug!(selection = name, area, "Evaluated selection.");
        areas.insert(name, area);
    }
    Ok(areas)
}
