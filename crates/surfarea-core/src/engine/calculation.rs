use super::error::EngineError;
use super::parameters::Parameters;
use super::result::SasaResult;
use crate::core::io::pdb::{PdbError, read_areas};
use crate::core::models::structure::{Structure, StructureView};
use nalgebra::Point3;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalculationError {
    #[error("{0}")]
    Failed(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Flat per-atom output of a surface calculation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawAreas {
    pub total: f64,
    pub per_atom: Vec<f64>,
}

impl RawAreas {
    pub fn from_per_atom(per_atom: Vec<f64>) -> Self {
        Self {
            total: per_atom.iter().sum(),
            per_atom,
        }
    }
}

/// The boundary to a surface area engine.
///
/// Implementations receive only coordinates and radii and must return exactly one area
/// per atom, in input order. Threading is up to the implementation; `n-threads` in the
/// parameters is a hint for it.
pub trait SurfaceCalculator {
    fn calculate(
        &self,
        structure: StructureView<'_>,
        parameters: &Parameters,
    ) -> Result<RawAreas, CalculationError>;
}

/// Replays per-atom areas computed earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputedAreas {
    areas: Vec<f64>,
}

impl PrecomputedAreas {
    pub fn new(areas: Vec<f64>) -> Self {
        Self { areas }
    }

    /// Loads the areas stored in the B-factor column of an annotated PDB file.
    pub fn from_annotated_pdb(path: impl AsRef<Path>) -> Result<Self, PdbError> {
        let file = File::open(path)?;
        let areas = read_areas(&mut BufReader::new(file))?;
        Ok(Self { areas })
    }

    pub fn areas(&self) -> &[f64] {
        &self.areas
    }
}

impl SurfaceCalculator for PrecomputedAreas {
    fn calculate(
        &self,
        structure: StructureView<'_>,
        _parameters: &Parameters,
    ) -> Result<RawAreas, CalculationError> {
        if structure.n_atoms() != self.areas.len() {
            return Err(CalculationError::InvalidInput(format!(
                "{} stored areas for {} atoms",
                self.areas.len(),
                structure.n_atoms()
            )));
        }
        Ok(RawAreas::from_per_atom(self.areas.clone()))
    }
}

fn check_count(areas: &RawAreas, expected: usize) -> Result<(), EngineError> {
    if areas.per_atom.len() != expected {
        return Err(EngineError::AtomCountMismatch {
            expected,
            actual: areas.per_atom.len(),
        });
    }
    Ok(())
}

/// Runs `calculator` on a structure. The result keeps a frozen copy of the structure for
/// later aggregation.
#[instrument(skip_all, name = "calculation", fields(atoms = structure.n_atoms(), algorithm = %parameters.algorithm()))]
pub fn calc(
    structure: &Structure,
    parameters: &Parameters,
    calculator: &dyn SurfaceCalculator,
) -> Result<SasaResult, EngineError> {
    let areas = calculator.calculate(structure.view(), parameters)?;
    check_count(&areas, structure.n_atoms())?;
    info!(total_area = areas.total, "Calculation complete.");
    Ok(SasaResult::new(areas, structure.snapshot()))
}

/// Runs `calculator` on bare coordinates, given as a flat `x, y, z` list with one radius
/// per point.
#[instrument(skip_all, name = "coordinate_calculation", fields(points = radii.len()))]
pub fn calc_coord(
    coords: &[f64],
    radii: &[f64],
    parameters: &Parameters,
    calculator: &dyn SurfaceCalculator,
) -> Result<RawAreas, EngineError> {
    if coords.len() != 3 * radii.len() {
        return Err(EngineError::InvalidCoordinates {
            coords: coords.len(),
            radii: radii.len(),
        });
    }
    if let Some((index, radius)) = radii
        .iter()
        .enumerate()
        .find(|(_, r)| !r.is_finite() || **r < 0.0)
    {
        return Err(CalculationError::InvalidInput(format!(
            "radius {} of point {} is not a non-negative number",
            radius, index
        ))
        .into());
    }

    let points: Vec<Point3<f64>> = coords
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();
    let areas = calculator.calculate(StructureView::new(&points, radii), parameters)?;
    check_count(&areas, radii.len())?;
    debug!(total_area = areas.total, "Coordinate calculation complete.");
    Ok(areas)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Reports each atom's radius as its area.
    pub struct RadiusAsArea;

    impl SurfaceCalculator for RadiusAsArea {
        fn calculate(
            &self,
            structure: StructureView<'_>,
            _parameters: &Parameters,
        ) -> Result<RawAreas, CalculationError> {
            Ok(RawAreas::from_per_atom(structure.radii().to_vec()))
        }
    }
}
