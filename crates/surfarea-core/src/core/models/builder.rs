use super::area::AreaBreakdown;
use super::atom::AtomRecord;
use super::options::StructureOptions;
use super::structure::{Structure, StructureError, resolve_radius};
use crate::core::classifier::table::TableClassifier;
use crate::core::classifier::{Classifier, UNKNOWN_CLASS};
use crate::core::io::pdb::{ParsedAtom, PdbFile};
use crate::core::io::traits::RecordFile;
use crate::core::utils::identifiers::is_hydrogen;
use crate::logging::{Verbosity, VerbosityGuard};
use nalgebra::Point3;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Atoms that passed filtering and classification, as parallel columns.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClassifiedAtoms {
    pub atoms: Vec<AtomRecord>,
    pub coords: Vec<Point3<f64>>,
    pub radii: Vec<f64>,
    pub references: HashMap<String, AreaBreakdown>,
}

impl ClassifiedAtoms {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// A frozen structure holding copies of the atoms matching `predicate`, in order.
    pub fn select<F>(&self, options: &StructureOptions, predicate: F) -> Structure
    where
        F: Fn(&AtomRecord) -> bool,
    {
        let mut atoms = Vec::new();
        let mut coords = Vec::new();
        let mut radii = Vec::new();
        let mut references = HashMap::new();
        for (index, atom) in self.atoms.iter().enumerate() {
            if !predicate(atom) {
                continue;
            }
            if let Some(reference) = self.references.get(&atom.residue_name) {
                references
                    .entry(atom.residue_name.clone())
                    .or_insert(*reference);
            }
            atoms.push(atom.clone());
            coords.push(self.coords[index]);
            radii.push(self.radii[index]);
        }
        Structure::from_columns(atoms, coords, radii, references, options.clone())
    }

    fn into_structure(self, options: StructureOptions) -> Structure {
        Structure::from_columns(
            self.atoms,
            self.coords,
            self.radii,
            self.references,
            options,
        )
    }
}

/// Drops hetero atoms and hydrogens unless the options include them, and every model
/// after the first unless `keep_all_models`.
pub(crate) fn filter_records(
    records: Vec<ParsedAtom>,
    options: &StructureOptions,
    keep_all_models: bool,
) -> Vec<ParsedAtom> {
    let first_model = records.first().map(|r| r.model);
    records
        .into_iter()
        .filter(|r| options.include_hetatm || !r.is_hetero)
        .filter(|r| options.include_hydrogen || !is_hydrogen(&r.name, r.element.as_deref()))
        .filter(|r| keep_all_models || Some(r.model) == first_model)
        .collect()
}

/// Assigns radius and class to every record, in order.
///
/// Native tables resolve all atoms in one bulk lookup; other classifiers are called once
/// per atom. Unknown atoms follow the options' policy.
pub(crate) fn classify_records(
    records: Vec<ParsedAtom>,
    classifier: &dyn Classifier,
    options: &StructureOptions,
) -> Result<ClassifiedAtoms, StructureError> {
    let assignments: Vec<(f64, String)> = match classifier.native_table() {
        Some(table) => table
            .assign_all(
                records
                    .iter()
                    .map(|r| (r.residue_name.as_str(), r.name.as_str())),
            )
            .into_iter()
            .map(|assigned| match assigned {
                Some(atom_type) => (atom_type.radius, atom_type.class.clone()),
                None => (-1.0, UNKNOWN_CLASS.to_string()),
            })
            .collect(),
        None => records
            .iter()
            .map(|r| {
                (
                    classifier.radius(&r.residue_name, &r.name),
                    classifier.classify(&r.residue_name, &r.name).into_owned(),
                )
            })
            .collect(),
    };

    let mut classified = ClassifiedAtoms::default();
    for (record, (radius, class_name)) in records.into_iter().zip(assignments) {
        let Some(radius) = resolve_radius(radius, &record.residue_name, &record.name, options)?
        else {
            continue;
        };

        let mut atom = AtomRecord::new(
            &record.name,
            &record.residue_name,
            &record.residue_number,
            record.chain_label,
        );
        atom.is_hetero = record.is_hetero;
        atom.model = record.model;
        atom.element = record.element;
        atom.set_class(&class_name);

        if !classified.references.contains_key(&atom.residue_name) {
            if let Some(reference) = classifier.reference_area(&atom.residue_name) {
                classified
                    .references
                    .insert(atom.residue_name.clone(), reference);
            }
        }

        classified.atoms.push(atom);
        classified.coords.push(record.coord);
        classified.radii.push(radius);
    }
    Ok(classified)
}

/// Configures and runs the construction of a [`Structure`] from a bulk source.
///
/// Options are validated before the source is touched, so invalid options never cause
/// I/O. A verbosity set here applies for the duration of the build only.
#[derive(Default)]
pub struct StructureBuilder<'c> {
    classifier: Option<&'c dyn Classifier>,
    options: StructureOptions,
    verbosity: Option<Verbosity>,
}

impl<'c> StructureBuilder<'c> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier(mut self, classifier: &'c dyn Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn options(mut self, options: StructureOptions) -> Self {
        self.options = options;
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    pub fn build_from_path(self, path: impl AsRef<Path>) -> Result<Structure, StructureError> {
        self.options.validate_for_structure()?;
        let _guard = self.verbosity.map(VerbosityGuard::set);

        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StructureError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let records = PdbFile::read_from(&mut BufReader::new(file))?;
        debug!("Read {} atom records from '{}'", records.len(), path.display());
        self.assemble(records)
    }

    pub fn build_from_reader(self, mut reader: impl BufRead) -> Result<Structure, StructureError> {
        self.options.validate_for_structure()?;
        let _guard = self.verbosity.map(VerbosityGuard::set);

        let records = PdbFile::read_from(&mut reader)?;
        self.assemble(records)
    }

    pub fn build_from_records(
        self,
        records: impl IntoIterator<Item = ParsedAtom>,
    ) -> Result<Structure, StructureError> {
        self.options.validate_for_structure()?;
        let _guard = self.verbosity.map(VerbosityGuard::set);

        self.assemble(records.into_iter().collect())
    }

    fn assemble(self, records: Vec<ParsedAtom>) -> Result<Structure, StructureError> {
        let classifier: &dyn Classifier = match self.classifier {
            Some(classifier) => classifier,
            None => TableClassifier::shared_default(),
        };
        let read = records.len();
        let kept = filter_records(records, &self.options, self.options.join_models);
        let classified = classify_records(kept, classifier, &self.options)?;

        if classified.is_empty() {
            return Err(StructureError::Read(format!(
                "no atoms left after filtering {} records",
                read
            )));
        }
        debug!(
            "Built structure with {} of {} atoms (options: {})",
            classified.len(),
            read,
            self.options
        );
        Ok(classified.into_structure(self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::AtomClass;
    use crate::core::io::pdb::fixtures::{
        SMALL_PROTEIN, TWO_MODELS_TWO_CHAINS, WITH_UNKNOWN_ATOM,
    };
    use crate::core::models::options::OptionsError;
    use crate::logging::{set_verbosity, verbosity};
    use serial_test::serial;
    use std::borrow::Cow;
    use std::cell::Cell;
    use std::io::{Cursor, Write};
    use std::sync::Arc;

    struct Counting {
        calls: Cell<usize>,
    }

    impl Classifier for Counting {
        fn classify(&self, _residue_name: &str, _atom_name: &str) -> Cow<'_, str> {
            Cow::Borrowed("Polar")
        }

        fn radius(&self, _residue_name: &str, _atom_name: &str) -> f64 {
            self.calls.set(self.calls.get() + 1);
            1.0
        }
    }

    fn build(content: &str, options: StructureOptions) -> Result<Structure, StructureError> {
        StructureBuilder::new()
            .options(options)
            .build_from_reader(Cursor::new(content))
    }

    #[test]
    fn default_options_drop_hetatm_and_hydrogen() {
        let structure = build(SMALL_PROTEIN, StructureOptions::default()).unwrap();
        assert_eq!(structure.n_atoms(), 9);
        assert!(structure.atoms().iter().all(|a| !a.is_hetero && a.name != "H"));
    }

    #[test]
    fn inclusion_flags_keep_matching_records() {
        let with_het = StructureOptions {
            include_hetatm: true,
            ..Default::default()
        };
        assert_eq!(build(SMALL_PROTEIN, with_het).unwrap().n_atoms(), 10);

        let with_h = StructureOptions {
            include_hydrogen: true,
            ..Default::default()
        };
        let structure = build(SMALL_PROTEIN, with_h).unwrap();
        assert_eq!(structure.n_atoms(), 10);
        assert_eq!(structure.atom_name(5).unwrap(), "H");
        assert_eq!(structure.radius(5).unwrap(), 0.0);
    }

    #[test]
    fn atom_count_matches_reference_filter_for_all_flag_combinations() {
        let records = PdbFile::read_from(&mut Cursor::new(SMALL_PROTEIN)).unwrap();
        for hetatm in [false, true] {
            for hydrogen in [false, true] {
                let options = StructureOptions {
                    include_hetatm: hetatm,
                    include_hydrogen: hydrogen,
                    ..Default::default()
                };
                let expected = records
                    .iter()
                    .filter(|r| hetatm || !r.is_hetero)
                    .filter(|r| hydrogen || r.element.as_deref() != Some("H"))
                    .count();
                assert_eq!(build(SMALL_PROTEIN, options).unwrap().n_atoms(), expected);
            }
        }
    }

    #[test]
    fn only_first_model_is_kept_unless_joined() {
        let first = build(TWO_MODELS_TWO_CHAINS, StructureOptions::default()).unwrap();
        assert_eq!(first.n_atoms(), 3);
        assert!(first.atoms().iter().all(|a| a.model == 1));

        let joined = build(
            TWO_MODELS_TWO_CHAINS,
            StructureOptions {
                join_models: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(joined.n_atoms(), 6);
    }

    #[test]
    fn unknown_atoms_follow_policy() {
        let tolerant = build(WITH_UNKNOWN_ATOM, StructureOptions::default()).unwrap();
        assert_eq!(tolerant.n_atoms(), 3);
        assert_eq!(tolerant.radius(1).unwrap(), 0.0);
        assert_eq!(tolerant.atom_class(1).unwrap(), AtomClass::Unknown);

        let skipping = build(
            WITH_UNKNOWN_ATOM,
            StructureOptions {
                skip_unknown: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(skipping.n_atoms(), 2);
        assert_eq!(skipping.atom_name(1).unwrap(), "CB");

        let err = build(
            WITH_UNKNOWN_ATOM,
            StructureOptions {
                halt_at_unknown: true,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StructureError::UnknownAtom { ref residue, ref atom } if residue == "ALA" && atom == "XX"
        ));
    }

    #[test]
    fn user_classifier_is_called_once_per_atom() {
        let classifier = Counting {
            calls: Cell::new(0),
        };
        let structure = StructureBuilder::new()
            .classifier(&classifier)
            .build_from_reader(Cursor::new(SMALL_PROTEIN))
            .unwrap();
        assert_eq!(classifier.calls.get(), structure.n_atoms());
        assert!(structure.radii().iter().all(|r| *r == 1.0));
        assert!(structure.atoms().iter().all(|a| a.class == AtomClass::Polar));
    }

    #[test]
    fn native_and_callback_paths_agree() {
        struct Wrapped(TableClassifier);
        impl Classifier for Wrapped {
            fn classify(&self, residue_name: &str, atom_name: &str) -> Cow<'_, str> {
                self.0.classify(residue_name, atom_name)
            }
            fn radius(&self, residue_name: &str, atom_name: &str) -> f64 {
                self.0.radius(residue_name, atom_name)
            }
        }

        let native = build(SMALL_PROTEIN, StructureOptions::default()).unwrap();
        let wrapped = Wrapped(TableClassifier::default());
        let callback = StructureBuilder::new()
            .classifier(&wrapped)
            .build_from_reader(Cursor::new(SMALL_PROTEIN))
            .unwrap();
        assert_eq!(native.atoms(), callback.atoms());
        assert_eq!(native.radii(), callback.radii());
    }

    #[test]
    fn invalid_options_fail_before_opening_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist.pdb");
        let options = StructureOptions {
            separate_chains: true,
            chain_groups: Some("A".to_string()),
            ..Default::default()
        };
        let err = StructureBuilder::new()
            .options(options)
            .build_from_path(&missing)
            .unwrap_err();
        assert!(matches!(err, StructureError::InvalidOptions(_)));
    }

    #[test]
    fn split_options_are_rejected_for_a_single_structure() {
        let options = StructureOptions {
            separate_models: true,
            chain_groups: Some("B".to_string()),
            ..Default::default()
        };
        let err = build(TWO_MODELS_TWO_CHAINS, options.clone()).unwrap_err();
        assert!(matches!(
            err,
            StructureError::InvalidOptions(OptionsError::SplitOnly("separate-models"))
        ));

        let err = Structure::with_classifier(Arc::new(TableClassifier::default()), options)
            .unwrap_err();
        assert!(matches!(
            err,
            StructureError::InvalidOptions(OptionsError::SplitOnly(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StructureBuilder::new()
            .build_from_path(dir.path().join("missing.pdb"))
            .unwrap_err();
        assert!(matches!(err, StructureError::Io { .. }));
    }

    #[test]
    fn build_from_path_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.pdb");
        let mut file = File::create(&path).unwrap();
        write!(file, "{}", SMALL_PROTEIN).unwrap();

        let structure = Structure::from_path(&path, None, &StructureOptions::default()).unwrap();
        assert_eq!(structure.n_atoms(), 9);
        assert!(structure.is_frozen());
    }

    #[test]
    fn empty_source_is_a_read_error() {
        let err = build("REMARK nothing here\nEND\n", StructureOptions::default()).unwrap_err();
        assert!(matches!(err, StructureError::Read(_)));
    }

    #[test]
    fn from_records_applies_filters_and_policy() {
        let records = PdbFile::read_from(&mut Cursor::new(SMALL_PROTEIN)).unwrap();
        let structure =
            Structure::from_records(records, None, &StructureOptions::default()).unwrap();
        assert_eq!(structure.n_atoms(), 9);
    }

    #[test]
    #[serial]
    fn verbosity_override_is_restored_after_build() {
        let original = verbosity();
        set_verbosity(Verbosity::Normal);
        StructureBuilder::new()
            .verbosity(Verbosity::Silent)
            .build_from_reader(Cursor::new(WITH_UNKNOWN_ATOM))
            .unwrap();
        assert_eq!(verbosity(), Verbosity::Normal);

        let _ = StructureBuilder::new()
            .verbosity(Verbosity::Debug)
            .build_from_reader(Cursor::new("END\n"));
        assert_eq!(verbosity(), Verbosity::Normal);
        set_verbosity(original);
    }
}
