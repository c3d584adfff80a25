use super::error::EngineError;
use super::result::SasaResult;
use crate::core::classifier::Classifier;
use tracing::debug;

/// Areas keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedAreas {
    entries: Vec<(String, f64)>,
}

/// Area per class name, in the order classes were first seen.
pub type ClassAreas = NamedAreas;

/// Area per selection name, in request order.
pub type SelectionAreas = NamedAreas;

impl NamedAreas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `area` to `name`, appending the name if it is new.
    pub fn accumulate(&mut self, name: &str, area: f64) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, total)) => *total += area,
            None => self.entries.push((name.to_string(), area)),
        }
    }

    /// Sets the area of `name`, keeping its position if already present.
    pub fn insert(&mut self, name: &str, area: f64) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, value)) => *value = area,
            None => self.entries.push((name.to_string(), area)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, area)| *area)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), *a))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sums atom areas per class name.
///
/// With a classifier, every atom is classified anew; without one, the class names
/// recorded when the structure was built are used.
pub fn classify_results(
    result: &SasaResult,
    classifier: Option<&dyn Classifier>,
) -> Result<ClassAreas, EngineError> {
    let structure = result.structure()?;
    let areas = result.atom_areas()?;

    let mut classes = ClassAreas::new();
    for (atom, &area) in structure.atoms().iter().zip(areas) {
        match classifier {
            Some(classifier) => {
                classes.accumulate(&classifier.classify(&atom.residue_name, &atom.name), area)
            }
            None => classes.accumulate(&atom.class_name, area),
        }
    }
    debug!(classes = classes.len(), "Classified atom areas.");
    Ok(classes)
}
