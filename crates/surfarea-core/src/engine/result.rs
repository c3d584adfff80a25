use super::calculation::RawAreas;
use super::error::EngineError;
use super::tree::ResultTree;
use crate::core::models::structure::Structure;
use std::cell::OnceCell;

/// The outcome of one calculation.
///
/// Holds the flat per-atom areas and a frozen copy of the structure they belong to. The
/// [`ResultTree`] is built from both on the first call to
/// [`residue_areas`](Self::residue_areas) and reused afterwards. A default-constructed
/// result holds nothing and every query on it fails with [`EngineError::NotInitialized`].
#[derive(Debug, Default)]
pub struct SasaResult {
    areas: Option<RawAreas>,
    structure: Option<Structure>,
    tree: OnceCell<ResultTree>,
}

impl SasaResult {
    pub(crate) fn new(areas: RawAreas, structure: Structure) -> Self {
        Self {
            areas: Some(areas),
            structure: Some(structure),
            tree: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.areas.is_some()
    }

    fn areas(&self) -> Result<&RawAreas, EngineError> {
        self.areas.as_ref().ok_or(EngineError::NotInitialized)
    }

    pub fn n_atoms(&self) -> usize {
        self.areas.as_ref().map_or(0, |a| a.per_atom.len())
    }

    pub fn total_area(&self) -> Result<f64, EngineError> {
        Ok(self.areas()?.total)
    }

    pub fn atom_area(&self, index: usize) -> Result<f64, EngineError> {
        let areas = self.areas()?;
        areas
            .per_atom
            .get(index)
            .copied()
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: areas.per_atom.len(),
            })
    }

    pub fn atom_areas(&self) -> Result<&[f64], EngineError> {
        Ok(&self.areas()?.per_atom)
    }

    /// The structure the areas were calculated for.
    pub fn structure(&self) -> Result<&Structure, EngineError> {
        self.structure.as_ref().ok_or(EngineError::NotInitialized)
    }

    /// The chain/residue/atom tree, built on first use.
    pub fn residue_areas(&self) -> Result<&ResultTree, EngineError> {
        let areas = self.areas()?;
        let structure = self.structure()?;
        Ok(self
            .tree
            .get_or_init(|| ResultTree::build(structure, &areas.per_atom)))
    }
}
