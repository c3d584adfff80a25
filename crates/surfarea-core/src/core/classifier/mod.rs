//! # Classifier Module
//!
//! Maps a (residue name, atom name) pair to a coarse atom class and a van der Waals
//! radius, and optionally provides per-residue reference areas used to compute relative
//! exposure.
//!
//! ## Variants
//!
//! - **Native tables** ([`table::TableClassifier`]): the default ProtOr table, the named
//!   standard tables in [`standard`], or a table loaded from a TOML file. These expose
//!   themselves through [`Classifier::native_table`], which lets structure construction
//!   assign every atom in a single bulk pass.
//! - **User-defined** classifiers: any other implementation of [`Classifier`]. They keep
//!   the default `native_table` (returning `None`), which marks them as user-defined and
//!   makes structure construction call back into them once per atom.
//!
//! ## Usage
//!
//! ```ignore
//! use surfarea::core::classifier::{Classifier, table::TableClassifier};
//!
//! let classifier = TableClassifier::standard("naccess")?;
//! assert_eq!(classifier.radius("ALA", "CA"), 1.87);
//! assert_eq!(classifier.classify("ALA", "N"), "Polar");
//! ```

pub mod standard;
pub mod table;

use crate::core::models::area::AreaBreakdown;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use table::TableClassifier;
use thiserror::Error;

/// Class name returned for atoms a classifier does not recognize.
pub const UNKNOWN_CLASS: &str = "Unknown";

/// Coarse chemical class of an atom, used for the polar/apolar area split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomClass {
    Polar,
    Apolar,
    #[default]
    Unknown,
}

impl AtomClass {
    /// Interprets a classifier class name. Anything other than polar/apolar
    /// (case-insensitive) is `Unknown`.
    pub fn from_class_name(name: &str) -> Self {
        name.parse().unwrap_or(AtomClass::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AtomClass::Polar => "Polar",
            AtomClass::Apolar => "Apolar",
            AtomClass::Unknown => UNKNOWN_CLASS,
        }
    }
}

impl FromStr for AtomClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polar" => Ok(AtomClass::Polar),
            "apolar" => Ok(AtomClass::Apolar),
            "unknown" => Ok(AtomClass::Unknown),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AtomClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which assignment path a classifier supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    /// Backed by a lookup table; atoms can be assigned in bulk.
    Native,
    /// Arbitrary logic; atoms are assigned one callback at a time.
    UserDefined,
}

/// Assigns classes and radii to atoms.
///
/// Implementations must be pure functions of their inputs. Names may arrive with PDB
/// column padding (`" CA "`); native tables trim them before lookup.
pub trait Classifier {
    /// Class of the atom. Unmatched atoms return [`UNKNOWN_CLASS`].
    fn classify(&self, residue_name: &str, atom_name: &str) -> Cow<'_, str>;

    /// Radius of the atom in Ångström. A negative value means "not recognized".
    fn radius(&self, residue_name: &str, atom_name: &str) -> f64;

    /// Reference (maximal) area of a residue type, if the classifier has one.
    fn reference_area(&self, _residue_name: &str) -> Option<AreaBreakdown> {
        None
    }

    /// The backing lookup table, if any. Returning `Some` marks the classifier as native.
    fn native_table(&self) -> Option<&TableClassifier> {
        None
    }

    fn kind(&self) -> ClassifierKind {
        if self.native_table().is_some() {
            ClassifierKind::Native
        } else {
            ClassifierKind::UserDefined
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    ConfigParse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid classifier configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown classifier '{0}' (expected one of: protor, naccess, oons)")]
    UnknownName(String),
}
