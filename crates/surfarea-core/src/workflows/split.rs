use crate::core::classifier::Classifier;
use crate::core::classifier::table::TableClassifier;
use crate::core::io::pdb::{ParsedAtom, PdbFile};
use crate::core::io::traits::RecordFile;
use crate::core::models::builder::{ClassifiedAtoms, classify_records, filter_records};
use crate::core::models::options::StructureOptions;
use crate::core::models::structure::{Structure, StructureError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Index;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Where a split structure came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SplitKey {
    /// The source model, or `None` when all models were joined.
    pub model: Option<usize>,
    /// The chain label or chain group the structure was restricted to, if any.
    pub chains: Option<String>,
}

/// An ordered collection of structures derived from one source.
#[derive(Debug, Clone, Default)]
pub struct StructureArray {
    entries: Vec<(SplitKey, Structure)>,
}

impl StructureArray {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Structure, StructureError> {
        self.entries
            .get(index)
            .map(|(_, structure)| structure)
            .ok_or(StructureError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    pub fn key(&self, index: usize) -> Option<&SplitKey> {
        self.entries.get(index).map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SplitKey, &Structure)> {
        self.entries.iter().map(|(key, structure)| (key, structure))
    }

    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.entries.iter().map(|(_, structure)| structure)
    }

    fn push(&mut self, model: Option<usize>, chains: Option<String>, structure: Structure) {
        debug!(
            "Split structure {} (model {:?}, chains {:?}) has {} atoms",
            self.entries.len(),
            model,
            chains,
            structure.n_atoms()
        );
        self.entries.push((SplitKey { model, chains }, structure));
    }
}

impl Index<usize> for StructureArray {
    type Output = Structure;

    fn index(&self, index: usize) -> &Structure {
        &self.entries[index].1
    }
}

impl IntoIterator for StructureArray {
    type Item = (SplitKey, Structure);
    type IntoIter = std::vec::IntoIter<(SplitKey, Structure)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Reads a PDB file and splits it into several structures.
///
/// See [`structure_array_from_reader`].
#[instrument(skip_all, name = "structure_array", fields(path = %path.as_ref().display()))]
pub fn structure_array(
    path: impl AsRef<Path>,
    classifier: Option<&dyn Classifier>,
    options: &StructureOptions,
) -> Result<StructureArray, StructureError> {
    options.validate_for_split()?;

    let path = path.as_ref();
    let file = File::open(path).map_err(|e| StructureError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let records = PdbFile::read_from(&mut BufReader::new(file))?;
    split_records(records, classifier, options)
}

/// Splits one source into structures by model, by chain and by chain group.
///
/// Base structures come first: one per retained model, or one per chain of each retained
/// model with `separate-chains`. Chain group structures follow, model by model, in the
/// order the groups are listed. Every atom is classified once; derived structures copy
/// the radii already assigned.
///
/// Options are validated before the source is read. A group that matches no atom of a
/// retained model fails the whole split.
#[instrument(skip_all, name = "structure_array")]
pub fn structure_array_from_reader(
    mut reader: impl BufRead,
    classifier: Option<&dyn Classifier>,
    options: &StructureOptions,
) -> Result<StructureArray, StructureError> {
    options.validate_for_split()?;
    let records = PdbFile::read_from(&mut reader)?;
    split_records(records, classifier, options)
}

fn split_records(
    records: Vec<ParsedAtom>,
    classifier: Option<&dyn Classifier>,
    options: &StructureOptions,
) -> Result<StructureArray, StructureError> {
    let classifier: &dyn Classifier = match classifier {
        Some(classifier) => classifier,
        None => TableClassifier::shared_default(),
    };
    let groups = options.chain_groups()?;
    let read = records.len();

    let keep_all_models = options.separate_models || options.join_models;
    let kept = filter_records(records, options, keep_all_models);
    let classified = classify_records(kept, classifier, options)?;
    let Some(first_model) = classified.atoms.first().map(|a| a.model) else {
        return Err(StructureError::Read(format!(
            "no atoms left after filtering {} records",
            read
        )));
    };

    let models: Vec<Option<usize>> = if options.separate_models {
        distinct_models(&classified).into_iter().map(Some).collect()
    } else if options.join_models {
        vec![None]
    } else {
        vec![Some(first_model)]
    };
    let in_model =
        |model: Option<usize>, atom_model: usize| model.is_none_or(|m| m == atom_model);

    let mut array = StructureArray::default();
    for &model in &models {
        if options.separate_chains {
            for label in chain_labels(&classified, model) {
                let structure = classified.select(options, |a| {
                    in_model(model, a.model) && a.chain_label == label
                });
                array.push(model, Some(label.to_string()), structure);
            }
        } else {
            let structure = classified.select(options, |a| in_model(model, a.model));
            array.push(model, None, structure);
        }
    }

    for &model in &models {
        for group in &groups {
            let structure = classified.select(options, |a| {
                in_model(model, a.model) && group.contains(a.chain_label)
            });
            if structure.is_empty() {
                return Err(StructureError::EmptyChainGroup {
                    group: group.clone(),
                    model: model.unwrap_or(first_model),
                });
            }
            array.push(model, Some(group.clone()), structure);
        }
    }

    info!(
        structures = array.len(),
        atoms = classified.len(),
        "Split source into structures."
    );
    Ok(array)
}

fn distinct_models(classified: &ClassifiedAtoms) -> Vec<usize> {
    let mut models = Vec::new();
    for atom in &classified.atoms {
        if !models.contains(&atom.model) {
            models.push(atom.model);
        }
    }
    models
}

fn chain_labels(classified: &ClassifiedAtoms, model: Option<usize>) -> Vec<char> {
    let mut labels = Vec::new();
    for atom in &classified.atoms {
        if model.is_none_or(|m| m == atom.model) && !labels.contains(&atom.chain_label) {
            labels.push(atom.chain_label);
        }
    }
    labels
}
