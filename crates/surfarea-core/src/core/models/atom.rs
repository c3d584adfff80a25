use super::structure::StructureError;
use crate::core::classifier::AtomClass;
use crate::core::utils::identifiers::is_main_chain_atom;

/// Whether an atom is part of the polymer backbone or of a side group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    MainChain,
    #[default]
    SideChain,
}

impl AtomRole {
    pub fn from_atom_name(atom_name: &str) -> Self {
        if is_main_chain_atom(atom_name) {
            AtomRole::MainChain
        } else {
            AtomRole::SideChain
        }
    }
}

/// One atom of a [`Structure`](super::structure::Structure), minus its coordinate and
/// radius which the structure stores in parallel columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Atom name with surrounding whitespace removed (e.g. "CA").
    pub name: String,
    pub residue_name: String,
    /// Residue sequence number including any insertion code (e.g. "52A").
    pub residue_number: String,
    pub chain_label: char,
    pub is_hetero: bool,
    /// 1-based index of the model block the atom was read from.
    pub model: usize,
    pub element: Option<String>,
    pub role: AtomRole,
    pub class: AtomClass,
    /// Class name exactly as the classifier reported it.
    pub class_name: String,
}

impl AtomRecord {
    pub fn new(name: &str, residue_name: &str, residue_number: &str, chain_label: char) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            residue_name: residue_name.trim().to_string(),
            residue_number: residue_number.trim().to_string(),
            chain_label,
            is_hetero: false,
            model: 1,
            element: None,
            role: AtomRole::from_atom_name(name),
            class: AtomClass::Unknown,
            class_name: AtomClass::Unknown.as_str().to_string(),
        }
    }

    pub fn is_main_chain(&self) -> bool {
        self.role == AtomRole::MainChain
    }

    pub(crate) fn set_class(&mut self, class_name: &str) {
        self.class = AtomClass::from_class_name(class_name);
        self.class_name = class_name.to_string();
    }
}

/// Residue number as supplied by a caller appending atoms by hand.
///
/// PDB residue numbers are at most four digits plus an insertion code, so text forms are
/// limited to five characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResidueNumber {
    Text(String),
    Integer(i64),
}

const MAX_RESIDUE_NUMBER_LEN: usize = 5;

impl ResidueNumber {
    /// Checks the value and returns its canonical text form.
    pub fn normalize(&self) -> Result<String, StructureError> {
        match self {
            ResidueNumber::Text(text) => {
                let trimmed = text.trim();
                let valid = !trimmed.is_empty()
                    && trimmed.len() <= MAX_RESIDUE_NUMBER_LEN
                    && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
                if valid {
                    Ok(trimmed.to_string())
                } else {
                    Err(StructureError::InvalidResidueNumber(text.clone()))
                }
            }
            ResidueNumber::Integer(value) => {
                if (-999..=9999).contains(value) {
                    Ok(value.to_string())
                } else {
                    Err(StructureError::InvalidResidueNumber(value.to_string()))
                }
            }
        }
    }
}

impl From<&str> for ResidueNumber {
    fn from(value: &str) -> Self {
        ResidueNumber::Text(value.to_string())
    }
}

impl From<String> for ResidueNumber {
    fn from(value: String) -> Self {
        ResidueNumber::Text(value)
    }
}

impl From<i32> for ResidueNumber {
    fn from(value: i32) -> Self {
        ResidueNumber::Integer(value.into())
    }
}

impl From<i64> for ResidueNumber {
    fn from(value: i64) -> Self {
        ResidueNumber::Integer(value)
    }
}

impl From<isize> for ResidueNumber {
    fn from(value: isize) -> Self {
        ResidueNumber::Integer(value as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_trims_names_and_derives_role() {
        let record = AtomRecord::new(" CA ", "ALA ", "  12A", 'A');
        assert_eq!(record.name, "CA");
        assert_eq!(record.residue_name, "ALA");
        assert_eq!(record.residue_number, "12A");
        assert_eq!(record.role, AtomRole::MainChain);
        assert!(record.is_main_chain());
        assert_eq!(record.class, AtomClass::Unknown);
        assert_eq!(record.model, 1);
    }

    #[test]
    fn side_chain_atoms_get_side_chain_role() {
        let record = AtomRecord::new("CB", "ALA", "1", 'A');
        assert_eq!(record.role, AtomRole::SideChain);
    }

    #[test]
    fn set_class_keeps_raw_name_and_parsed_class() {
        let mut record = AtomRecord::new("N", "ALA", "1", 'A');
        record.set_class("polar");
        assert_eq!(record.class, AtomClass::Polar);
        assert_eq!(record.class_name, "polar");
    }

    #[test]
    fn residue_number_accepts_text_and_integers() {
        assert_eq!(ResidueNumber::from("1").normalize().unwrap(), "1");
        assert_eq!(ResidueNumber::from(" 52A").normalize().unwrap(), "52A");
        assert_eq!(ResidueNumber::from(String::from("-3")).normalize().unwrap(), "-3");
        assert_eq!(ResidueNumber::from(7i32).normalize().unwrap(), "7");
        assert_eq!(ResidueNumber::from(42i64).normalize().unwrap(), "42");
        assert_eq!(ResidueNumber::from(9isize).normalize().unwrap(), "9");
    }

    #[test]
    fn residue_number_rejects_malformed_values() {
        for bad in ["", "   ", "123456", "1 2", "1.5"] {
            let err = ResidueNumber::from(bad).normalize().unwrap_err();
            assert!(matches!(err, StructureError::InvalidResidueNumber(_)), "{bad:?}");
        }
        assert!(matches!(
            ResidueNumber::from(100_000i64).normalize(),
            Err(StructureError::InvalidResidueNumber(_))
        ));
    }
}
