use super::area::AreaBreakdown;
use super::atom::{AtomRecord, ResidueNumber};
use super::builder::StructureBuilder;
use super::options::{OptionsError, StructureOptions};
use crate::core::classifier::table::TableClassifier;
use crate::core::classifier::{AtomClass, Classifier};
use crate::core::io::pdb::{ParsedAtom, PdbError};
use nalgebra::Point3;
use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),
    #[error("Unknown atom '{atom}' in residue '{residue}'")]
    UnknownAtom { residue: String, atom: String },
    #[error("Invalid residue number '{0}'")]
    InvalidResidueNumber(String),
    #[error("Could not read structure: {0}")]
    Read(String),
    #[error("Atom index {index} out of range (structure has {len} atoms)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Expected {expected} radii, got {actual}")]
    RadiusCountMismatch { expected: usize, actual: usize },
    #[error("Radius of atom {index} must be a non-negative number (got {value})")]
    NegativeRadius { index: usize, value: f64 },
    #[error("Atoms can only be added to structures created empty")]
    Frozen,
    #[error("Chain group '{group}' matches no atoms in model {model}")]
    EmptyChainGroup { group: String, model: usize },
    #[error("PDB error: {0}")]
    Pdb(#[from] PdbError),
}

/// What [`Structure::add_atom`] did with the atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The atom was appended at this index.
    Added(usize),
    /// The atom could not be given a radius and `skip-unknown` is set.
    Skipped,
}

/// Read-only coordinates and radii, the only part of a structure a calculator sees.
#[derive(Debug, Clone, Copy)]
pub struct StructureView<'a> {
    coords: &'a [Point3<f64>],
    radii: &'a [f64],
}

impl<'a> StructureView<'a> {
    pub(crate) fn new(coords: &'a [Point3<f64>], radii: &'a [f64]) -> Self {
        Self { coords, radii }
    }

    pub fn n_atoms(&self) -> usize {
        self.radii.len()
    }

    pub fn coords(&self) -> &'a [Point3<f64>] {
        self.coords
    }

    pub fn radii(&self) -> &'a [f64] {
        self.radii
    }
}

#[derive(Clone)]
struct AppendContext {
    classifier: Arc<dyn Classifier>,
}

impl fmt::Debug for AppendContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppendContext")
            .field("classifier", &self.classifier.kind())
            .finish()
    }
}

/// An ordered set of atoms with one radius per atom.
///
/// Atom order is insertion or parse order and is the canonical atom index everywhere.
/// Structures read from a source are frozen: their atom membership never changes, though
/// radii may still be replaced. Structures created empty keep a classifier so atoms can be
/// appended one at a time.
#[derive(Debug, Clone)]
pub struct Structure {
    atoms: Vec<AtomRecord>,
    coords: Vec<Point3<f64>>,
    radii: Vec<f64>,
    references: HashMap<String, AreaBreakdown>,
    options: StructureOptions,
    append: Option<AppendContext>,
}

impl Default for Structure {
    fn default() -> Self {
        Self::new()
    }
}

impl Structure {
    /// An empty structure that classifies appended atoms with the default table.
    pub fn new() -> Self {
        Self {
            atoms: Vec::new(),
            coords: Vec::new(),
            radii: Vec::new(),
            references: HashMap::new(),
            options: StructureOptions::default(),
            append: Some(AppendContext {
                classifier: Arc::new(TableClassifier::default()),
            }),
        }
    }

    /// An empty structure that classifies appended atoms with `classifier`, applying the
    /// unknown-atom policy of `options`.
    pub fn with_classifier(
        classifier: Arc<dyn Classifier>,
        options: StructureOptions,
    ) -> Result<Self, StructureError> {
        options.validate_for_structure()?;
        Ok(Self {
            options,
            append: Some(AppendContext { classifier }),
            ..Self::new()
        })
    }

    /// Starts a [`StructureBuilder`] for reading with non-default settings.
    pub fn builder<'c>() -> StructureBuilder<'c> {
        StructureBuilder::new()
    }

    /// Reads a single structure from a PDB file.
    ///
    /// # Arguments
    ///
    /// * `path` - The PDB file to read.
    /// * `classifier` - Assigns radii and classes; the default table when `None`.
    /// * `options` - Record filters and the unknown-atom policy.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::Io`] if the file cannot be opened, [`StructureError::Pdb`] for
    /// malformed records, [`StructureError::InvalidOptions`] if `options` conflict or ask
    /// for a split, and [`StructureError::UnknownAtom`] under `halt-at-unknown`.
    pub fn from_path(
        path: impl AsRef<Path>,
        classifier: Option<&dyn Classifier>,
        options: &StructureOptions,
    ) -> Result<Self, StructureError> {
        let mut builder = StructureBuilder::new().options(options.clone());
        if let Some(classifier) = classifier {
            builder = builder.classifier(classifier);
        }
        builder.build_from_path(path)
    }

    /// Reads a single structure from PDB text.
    ///
    /// # Arguments
    ///
    /// * `reader` - Source of PDB records.
    /// * `classifier` - Assigns radii and classes; the default table when `None`.
    /// * `options` - Record filters and the unknown-atom policy.
    ///
    /// # Errors
    ///
    /// Same as [`Structure::from_path`], without the file-open failure.
    pub fn from_reader(
        reader: impl BufRead,
        classifier: Option<&dyn Classifier>,
        options: &StructureOptions,
    ) -> Result<Self, StructureError> {
        let mut builder = StructureBuilder::new().options(options.clone());
        if let Some(classifier) = classifier {
            builder = builder.classifier(classifier);
        }
        builder.build_from_reader(reader)
    }

    /// Builds a structure from records produced elsewhere, applying the same filters and
    /// unknown-atom policy as a file read.
    pub fn from_records(
        records: impl IntoIterator<Item = ParsedAtom>,
        classifier: Option<&dyn Classifier>,
        options: &StructureOptions,
    ) -> Result<Self, StructureError> {
        let mut builder = StructureBuilder::new().options(options.clone());
        if let Some(classifier) = classifier {
            builder = builder.classifier(classifier);
        }
        builder.build_from_records(records)
    }

    /// A frozen structure over already classified columns.
    pub(crate) fn from_columns(
        atoms: Vec<AtomRecord>,
        coords: Vec<Point3<f64>>,
        radii: Vec<f64>,
        references: HashMap<String, AreaBreakdown>,
        options: StructureOptions,
    ) -> Self {
        debug_assert_eq!(atoms.len(), coords.len());
        debug_assert_eq!(atoms.len(), radii.len());
        Self {
            atoms,
            coords,
            radii,
            references,
            options,
            append: None,
        }
    }

    /// A frozen copy, as kept alongside calculation results.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            append: None,
            ..self.clone()
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.append.is_none()
    }

    pub fn options(&self) -> &StructureOptions {
        &self.options
    }

    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    pub fn coords(&self) -> &[Point3<f64>] {
        &self.coords
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn view(&self) -> StructureView<'_> {
        StructureView::new(&self.coords, &self.radii)
    }

    fn atom(&self, index: usize) -> Result<&AtomRecord, StructureError> {
        self.atoms.get(index).ok_or(StructureError::IndexOutOfRange {
            index,
            len: self.atoms.len(),
        })
    }

    /// Name of the atom at `index`, without column padding.
    ///
    /// This and the accessors below fail with [`StructureError::IndexOutOfRange`] when
    /// `index >= n_atoms()`.
    pub fn atom_name(&self, index: usize) -> Result<&str, StructureError> {
        Ok(&self.atom(index)?.name)
    }

    pub fn residue_name(&self, index: usize) -> Result<&str, StructureError> {
        Ok(&self.atom(index)?.residue_name)
    }

    /// Residue number with its insertion code, as written in the source.
    pub fn residue_number(&self, index: usize) -> Result<&str, StructureError> {
        Ok(&self.atom(index)?.residue_number)
    }

    pub fn chain_label(&self, index: usize) -> Result<char, StructureError> {
        Ok(self.atom(index)?.chain_label)
    }

    /// Polar/apolar class assigned by the classifier.
    pub fn atom_class(&self, index: usize) -> Result<AtomClass, StructureError> {
        Ok(self.atom(index)?.class)
    }

    /// Whether the atom came from a `HETATM` record.
    pub fn is_hetero(&self, index: usize) -> Result<bool, StructureError> {
        Ok(self.atom(index)?.is_hetero)
    }

    /// Model number the atom was read from (1 for single-model files).
    pub fn model(&self, index: usize) -> Result<usize, StructureError> {
        Ok(self.atom(index)?.model)
    }

    pub fn coord(&self, index: usize) -> Result<Point3<f64>, StructureError> {
        self.atom(index)?;
        Ok(self.coords[index])
    }

    /// Radius in Ångström.
    pub fn radius(&self, index: usize) -> Result<f64, StructureError> {
        self.atom(index)?;
        Ok(self.radii[index])
    }

    /// Reference area for a residue type, as provided by the classifier at construction.
    pub fn reference_area(&self, residue_name: &str) -> Option<&AreaBreakdown> {
        self.references.get(residue_name.trim())
    }

    pub(crate) fn references(&self) -> &HashMap<String, AreaBreakdown> {
        &self.references
    }

    /// Distinct chain labels in first-seen order.
    pub fn chain_labels(&self) -> Vec<char> {
        let mut labels = Vec::new();
        for atom in &self.atoms {
            if !labels.contains(&atom.chain_label) {
                labels.push(atom.chain_label);
            }
        }
        labels
    }

    /// Appends one atom, classified by the classifier bound at creation.
    ///
    /// On error the structure is left unchanged.
    pub fn add_atom(
        &mut self,
        atom_name: &str,
        residue_name: &str,
        residue_number: impl Into<ResidueNumber>,
        chain_label: char,
        coord: Point3<f64>,
    ) -> Result<AppendOutcome, StructureError> {
        let context = self.append.as_ref().ok_or(StructureError::Frozen)?;
        let residue_number = residue_number.into().normalize()?;
        let mut record = AtomRecord::new(atom_name, residue_name, &residue_number, chain_label);

        let radius = context
            .classifier
            .radius(&record.residue_name, &record.name);
        let Some(radius) =
            resolve_radius(radius, &record.residue_name, &record.name, &self.options)?
        else {
            return Ok(AppendOutcome::Skipped);
        };
        record.set_class(
            &context
                .classifier
                .classify(&record.residue_name, &record.name),
        );
        if !self.references.contains_key(&record.residue_name) {
            if let Some(reference) = context.classifier.reference_area(&record.residue_name) {
                self.references
                    .insert(record.residue_name.clone(), reference);
            }
        }

        self.atoms.push(record);
        self.coords.push(coord);
        self.radii.push(radius);
        Ok(AppendOutcome::Added(self.atoms.len() - 1))
    }

    /// Replaces every radius. Nothing is written unless all values are valid.
    pub fn set_radii(&mut self, radii: &[f64]) -> Result<(), StructureError> {
        if radii.len() != self.radii.len() {
            return Err(StructureError::RadiusCountMismatch {
                expected: self.radii.len(),
                actual: radii.len(),
            });
        }
        if let Some((index, &value)) = radii
            .iter()
            .enumerate()
            .find(|(_, r)| !is_valid_radius(**r))
        {
            return Err(StructureError::NegativeRadius { index, value });
        }
        self.radii.copy_from_slice(radii);
        Ok(())
    }

    /// Overrides the radius of one atom.
    ///
    /// # Arguments
    ///
    /// * `index` - Atom index.
    /// * `radius` - New radius in Ångström.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::IndexOutOfRange`] for a bad index and
    /// [`StructureError::NegativeRadius`] for a negative or non-finite radius. The
    /// structure is unchanged on error.
    pub fn set_radius(&mut self, index: usize, radius: f64) -> Result<(), StructureError> {
        self.atom(index)?;
        if !is_valid_radius(radius) {
            return Err(StructureError::NegativeRadius {
                index,
                value: radius,
            });
        }
        self.radii[index] = radius;
        Ok(())
    }

    /// Recomputes every radius with another classifier. Atoms it does not recognize get
    /// radius 0, or abort the update under `halt-at-unknown`.
    pub fn set_radii_with_classifier(
        &mut self,
        classifier: &dyn Classifier,
    ) -> Result<(), StructureError> {
        let tolerant = StructureOptions {
            skip_unknown: false,
            ..self.options.clone()
        };
        let mut radii = Vec::with_capacity(self.atoms.len());
        for atom in &self.atoms {
            let radius = classifier.radius(&atom.residue_name, &atom.name);
            let radius = resolve_radius(radius, &atom.residue_name, &atom.name, &tolerant)?;
            radii.push(radius.unwrap_or(0.0));
        }
        self.radii = radii;
        Ok(())
    }
}

fn is_valid_radius(radius: f64) -> bool {
    radius.is_finite() && radius >= 0.0
}

/// Applies the unknown-atom policy to a classifier radius. `None` means drop the atom.
pub(crate) fn resolve_radius(
    radius: f64,
    residue_name: &str,
    atom_name: &str,
    options: &StructureOptions,
) -> Result<Option<f64>, StructureError> {
    if is_valid_radius(radius) {
        return Ok(Some(radius));
    }
    if options.halt_at_unknown {
        return Err(StructureError::UnknownAtom {
            residue: residue_name.to_string(),
            atom: atom_name.to_string(),
        });
    }
    if options.skip_unknown {
        warn!("Skipping unknown atom '{}' in residue '{}'", atom_name, residue_name);
        return Ok(None);
    }
    warn!(
        "Unknown atom '{}' in residue '{}', assigning radius 0",
        atom_name, residue_name
    );
    Ok(Some(0.0))
}
