use super::standard::{ANY_RESIDUE, StandardClassifier};
use super::{Classifier, ClassifierError, UNKNOWN_CLASS};
use crate::core::models::area::AreaBreakdown;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static DEFAULT_TABLE: LazyLock<TableClassifier> =
    LazyLock::new(|| TableClassifier::from_standard(StandardClassifier::ProtOr));

/// Radius and class shared by every atom of one atom type.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomType {
    pub radius: f64,
    pub class: String,
}

/// A classifier backed by lookup tables.
///
/// Atoms resolve in two steps: `(residue, atom)` to an atom type, then the type to a
/// radius and class. Residue-specific entries take precedence over the `ANY` residue.
#[derive(Debug, Clone, PartialEq)]
pub struct TableClassifier {
    name: String,
    types: HashMap<String, AtomType>,
    atoms: HashMap<String, HashMap<String, String>>,
    references: HashMap<String, AreaBreakdown>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    name: String,
    types: HashMap<String, RawAtomType>,
    #[serde(default)]
    atoms: HashMap<String, HashMap<String, String>>,
    #[serde(default)]
    reference: HashMap<String, RawReference>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAtomType {
    radius: f64,
    class: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawReference {
    main_chain: f64,
    side_chain: f64,
    polar: f64,
    apolar: f64,
}

impl Default for TableClassifier {
    fn default() -> Self {
        Self::shared_default().clone()
    }
}

impl TableClassifier {
    /// The process-wide ProtOr table, built on first use.
    pub fn shared_default() -> &'static TableClassifier {
        &DEFAULT_TABLE
    }

    /// One of the built-in tables, selected case-insensitively by name.
    pub fn standard(name: &str) -> Result<Self, ClassifierError> {
        let standard: StandardClassifier = name.parse()?;
        Ok(Self::from_standard(standard))
    }

    pub fn from_standard(standard: StandardClassifier) -> Self {
        let types = standard
            .types()
            .entries()
            .map(|(name, (radius, class))| {
                (
                    name.to_string(),
                    AtomType {
                        radius: *radius,
                        class: class.to_string(),
                    },
                )
            })
            .collect();

        let mut atoms: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (residue, atom, atom_type) in StandardClassifier::atom_entries() {
            atoms
                .entry(residue.to_string())
                .or_default()
                .insert(atom.to_string(), atom_type.to_string());
        }

        let references = standard
            .references()
            .into_iter()
            .map(|(residue, reference)| (residue.to_string(), reference))
            .collect();

        Self {
            name: standard.name().to_string(),
            types,
            atoms,
            references,
        }
    }

    /// Loads a table from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ClassifierError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawTable = toml::from_str(&content).map_err(|e| ClassifierError::ConfigParse {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let table = Self::from_raw(raw)?;
        debug!(
            "Loaded classifier '{}' from '{}' ({} atom types)",
            table.name,
            path.display(),
            table.types.len()
        );
        Ok(table)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ClassifierError> {
        let raw: RawTable = toml::from_str(content).map_err(|e| ClassifierError::ConfigParse {
            path: "<inline>".to_string(),
            source: e,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTable) -> Result<Self, ClassifierError> {
        let mut types = HashMap::with_capacity(raw.types.len());
        for (name, raw_type) in raw.types {
            if !raw_type.radius.is_finite() || raw_type.radius < 0.0 {
                return Err(ClassifierError::InvalidConfig(format!(
                    "atom type '{}' has invalid radius {}",
                    name, raw_type.radius
                )));
            }
            types.insert(
                name.trim().to_string(),
                AtomType {
                    radius: raw_type.radius,
                    class: raw_type.class.trim().to_string(),
                },
            );
        }

        let mut atoms: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (residue, entries) in raw.atoms {
            let residue = residue.trim().to_string();
            for (atom, atom_type) in entries {
                let atom_type = atom_type.trim();
                if !types.contains_key(atom_type) {
                    return Err(ClassifierError::InvalidConfig(format!(
                        "atom '{} {}' refers to undeclared type '{}'",
                        residue,
                        atom.trim(),
                        atom_type
                    )));
                }
                atoms
                    .entry(residue.clone())
                    .or_default()
                    .insert(atom.trim().to_string(), atom_type.to_string());
            }
        }

        let mut references = HashMap::with_capacity(raw.reference.len());
        for (residue, r) in raw.reference {
            let values = [r.main_chain, r.side_chain, r.polar, r.apolar];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(ClassifierError::InvalidConfig(format!(
                    "reference area of residue '{}' must be finite and non-negative",
                    residue.trim()
                )));
            }
            references.insert(
                residue.trim().to_string(),
                AreaBreakdown::reference(r.main_chain, r.side_chain, r.polar, r.apolar),
            );
        }

        Ok(Self {
            name: raw.name.trim().to_string(),
            types,
            atoms,
            references,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves an atom to its type entry; names are trimmed before lookup.
    pub fn lookup(&self, residue_name: &str, atom_name: &str) -> Option<&AtomType> {
        let residue_name = residue_name.trim();
        let atom_name = atom_name.trim();
        let type_name = self
            .atoms
            .get(residue_name)
            .and_then(|entries| entries.get(atom_name))
            .or_else(|| {
                self.atoms
                    .get(ANY_RESIDUE)
                    .and_then(|entries| entries.get(atom_name))
            })?;
        self.types.get(type_name)
    }

    /// Resolves many atoms at once, in input order. `None` marks an unrecognized atom.
    pub fn assign_all<'a, I>(&self, atoms: I) -> Vec<Option<&AtomType>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        atoms
            .into_iter()
            .map(|(residue_name, atom_name)| self.lookup(residue_name, atom_name))
            .collect()
    }

    pub fn references(&self) -> &HashMap<String, AreaBreakdown> {
        &self.references
    }
}

impl Classifier for TableClassifier {
    fn classify(&self, residue_name: &str, atom_name: &str) -> Cow<'_, str> {
        match self.lookup(residue_name, atom_name) {
            Some(atom_type) => Cow::Borrowed(atom_type.class.as_str()),
            None => Cow::Borrowed(UNKNOWN_CLASS),
        }
    }

    fn radius(&self, residue_name: &str, atom_name: &str) -> f64 {
        self.lookup(residue_name, atom_name)
            .map_or(-1.0, |atom_type| atom_type.radius)
    }

    fn reference_area(&self, residue_name: &str) -> Option<AreaBreakdown> {
        self.references.get(residue_name.trim()).copied()
    }

    fn native_table(&self) -> Option<&TableClassifier> {
        Some(self)
    }
}
