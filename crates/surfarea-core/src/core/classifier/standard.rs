use crate::core::models::area::AreaBreakdown;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;

use super::ClassifierError;

/// Residue name whose atom entries apply to every residue.
pub const ANY_RESIDUE: &str = "ANY";

/// Atom types shared by every residue (backbone and the generic beta carbon).
static ANY_RESIDUE_ATOMS: Map<&'static str, &'static str> = phf_map! {
    "N" => "N3H1",
    "CA" => "C4H1",
    "C" => "C3H0",
    "O" => "O1H0",
    "OXT" => "O2H1",
    "CB" => "C4H2",
};

/// Residue specific atom types, keyed by `"<residue> <atom>"`.
static RESIDUE_ATOMS: Map<&'static str, &'static str> = phf_map! {
    "ALA CB" => "C4H3",
    "ARG CG" => "C4H2", "ARG CD" => "C4H2", "ARG NE" => "N3H1", "ARG CZ" => "C3H0",
    "ARG NH1" => "N3H2", "ARG NH2" => "N3H2",
    "ASN CG" => "C3H0", "ASN OD1" => "O1H0", "ASN ND2" => "N3H2",
    "ASP CG" => "C3H0", "ASP OD1" => "O1H0", "ASP OD2" => "O2H1",
    "CYS SG" => "S2H1",
    "GLN CG" => "C4H2", "GLN CD" => "C3H0", "GLN OE1" => "O1H0", "GLN NE2" => "N3H2",
    "GLU CG" => "C4H2", "GLU CD" => "C3H0", "GLU OE1" => "O1H0", "GLU OE2" => "O2H1",
    "GLY CA" => "C4H2",
    "HIS CG" => "C3H0", "HIS ND1" => "N3H1", "HIS CD2" => "C3H1", "HIS CE1" => "C3H1",
    "HIS NE2" => "N3H1",
    "ILE CB" => "C4H1", "ILE CG1" => "C4H2", "ILE CG2" => "C4H3", "ILE CD1" => "C4H3",
    "LEU CG" => "C4H1", "LEU CD1" => "C4H3", "LEU CD2" => "C4H3",
    "LYS CG" => "C4H2", "LYS CD" => "C4H2", "LYS CE" => "C4H2", "LYS NZ" => "N4H3",
    "MET CG" => "C4H2", "MET SD" => "S2H0", "MET CE" => "C4H3",
    "MSE CG" => "C4H2", "MSE SE" => "SE2H0", "MSE CE" => "C4H3",
    "PHE CG" => "C3H0", "PHE CD1" => "C3H1", "PHE CD2" => "C3H1", "PHE CE1" => "C3H1",
    "PHE CE2" => "C3H1", "PHE CZ" => "C3H1",
    "PRO N" => "N3H0", "PRO CG" => "C4H2", "PRO CD" => "C4H2",
    "SER OG" => "O2H1",
    "THR CB" => "C4H1", "THR OG1" => "O2H1", "THR CG2" => "C4H3",
    "TRP CG" => "C3H0", "TRP CD1" => "C3H1", "TRP CD2" => "C3H0", "TRP NE1" => "N3H1",
    "TRP CE2" => "C3H0", "TRP CE3" => "C3H1", "TRP CZ2" => "C3H1", "TRP CZ3" => "C3H1",
    "TRP CH2" => "C3H1",
    "TYR CG" => "C3H0", "TYR CD1" => "C3H1", "TYR CD2" => "C3H1", "TYR CE1" => "C3H1",
    "TYR CE2" => "C3H1", "TYR CZ" => "C3H0", "TYR OH" => "O2H1",
    "VAL CB" => "C4H1", "VAL CG1" => "C4H3", "VAL CG2" => "C4H3",
};

// Atom types of Tsai et al. (1999), radii in Ångström.
static PROTOR_TYPES: Map<&'static str, (f64, &'static str)> = phf_map! {
    "C3H0" => (1.61, "Apolar"),
    "C3H1" => (1.76, "Apolar"),
    "C4H1" => (1.88, "Apolar"),
    "C4H2" => (1.88, "Apolar"),
    "C4H3" => (1.88, "Apolar"),
    "N3H0" => (1.64, "Polar"),
    "N3H1" => (1.64, "Polar"),
    "N3H2" => (1.64, "Polar"),
    "N4H3" => (1.64, "Polar"),
    "O1H0" => (1.42, "Polar"),
    "O2H1" => (1.46, "Polar"),
    "S2H0" => (1.77, "Apolar"),
    "S2H1" => (1.77, "Apolar"),
    "SE2H0" => (1.90, "Apolar"),
};

static NACCESS_TYPES: Map<&'static str, (f64, &'static str)> = phf_map! {
    "C3H0" => (1.76, "Apolar"),
    "C3H1" => (1.76, "Apolar"),
    "C4H1" => (1.87, "Apolar"),
    "C4H2" => (1.87, "Apolar"),
    "C4H3" => (1.87, "Apolar"),
    "N3H0" => (1.65, "Polar"),
    "N3H1" => (1.65, "Polar"),
    "N3H2" => (1.65, "Polar"),
    "N4H3" => (1.50, "Polar"),
    "O1H0" => (1.40, "Polar"),
    "O2H1" => (1.40, "Polar"),
    "S2H0" => (1.85, "Apolar"),
    "S2H1" => (1.85, "Apolar"),
    "SE2H0" => (1.80, "Apolar"),
};

static OONS_TYPES: Map<&'static str, (f64, &'static str)> = phf_map! {
    "C3H0" => (1.55, "Apolar"),
    "C3H1" => (1.75, "Apolar"),
    "C4H1" => (2.00, "Apolar"),
    "C4H2" => (2.00, "Apolar"),
    "C4H3" => (2.00, "Apolar"),
    "N3H0" => (1.55, "Polar"),
    "N3H1" => (1.55, "Polar"),
    "N3H2" => (1.55, "Polar"),
    "N4H3" => (1.55, "Polar"),
    "O1H0" => (1.40, "Polar"),
    "O2H1" => (1.40, "Polar"),
    "S2H0" => (2.00, "Apolar"),
    "S2H1" => (2.00, "Apolar"),
    "SE2H0" => (1.90, "Apolar"),
};

// Ala-X-Ala reference areas with ProtOr radii: main chain, side chain, polar, apolar.
static PROTOR_REFERENCE: Map<&'static str, [f64; 4]> = phf_map! {
    "ALA" => [38.54, 69.41, 38.55, 69.40],
    "ARG" => [37.96, 200.80, 143.94, 94.82],
    "ASN" => [37.70, 106.74, 104.88, 39.56],
    "ASP" => [37.70, 106.67, 102.83, 41.54],
    "CYS" => [37.53, 97.30, 36.63, 98.20],
    "GLN" => [37.88, 140.21, 119.42, 58.67],
    "GLU" => [37.49, 140.27, 112.82, 64.94],
    "GLY" => [81.09, 0.00, 44.65, 36.44],
    "HIS" => [37.88, 144.84, 88.62, 94.10],
    "ILE" => [37.04, 140.86, 36.89, 141.01],
    "LEU" => [37.88, 140.86, 37.47, 141.27],
    "LYS" => [37.42, 158.09, 78.29, 117.22],
    "MET" => [37.86, 157.37, 37.38, 157.85],
    "PHE" => [38.09, 161.84, 37.48, 162.45],
    "PRO" => [27.28, 108.67, 19.93, 116.02],
    "SER" => [38.40, 77.85, 69.62, 46.63],
    "THR" => [37.13, 104.39, 60.43, 81.09],
    "TRP" => [38.17, 202.47, 57.74, 182.90],
    "TYR" => [38.19, 176.12, 80.08, 134.23],
    "VAL" => [37.60, 114.31, 37.38, 114.53],
};

/// The built-in classifier tables selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StandardClassifier {
    /// ProtOr radii (Tsai et al.), with residue reference areas.
    #[default]
    ProtOr,
    /// Radii used by NACCESS.
    Naccess,
    /// Radii of Ooi, Oobatake, Nemethy and Scheraga.
    Oons,
}

impl StandardClassifier {
    pub const ALL: [StandardClassifier; 3] = [
        StandardClassifier::ProtOr,
        StandardClassifier::Naccess,
        StandardClassifier::Oons,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StandardClassifier::ProtOr => "ProtOr",
            StandardClassifier::Naccess => "NACCESS",
            StandardClassifier::Oons => "OONS",
        }
    }

    pub(crate) fn types(&self) -> &'static Map<&'static str, (f64, &'static str)> {
        match self {
            StandardClassifier::ProtOr => &PROTOR_TYPES,
            StandardClassifier::Naccess => &NACCESS_TYPES,
            StandardClassifier::Oons => &OONS_TYPES,
        }
    }

    /// Every `(residue, atom, type)` entry of the shared atom typing, generic residue first.
    pub(crate) fn atom_entries() -> impl Iterator<Item = (&'static str, &'static str, &'static str)>
    {
        let generic = ANY_RESIDUE_ATOMS
            .entries()
            .map(|(atom, atom_type)| (ANY_RESIDUE, *atom, *atom_type));
        let specific = RESIDUE_ATOMS.entries().filter_map(|(key, atom_type)| {
            key.split_once(' ')
                .map(|(residue, atom)| (residue, atom, *atom_type))
        });
        generic.chain(specific)
    }

    pub(crate) fn references(&self) -> Vec<(&'static str, AreaBreakdown)> {
        match self {
            StandardClassifier::ProtOr => PROTOR_REFERENCE
                .entries()
                .map(|(residue, [main, side, polar, apolar])| {
                    (*residue, AreaBreakdown::reference(*main, *side, *polar, *apolar))
                })
                .collect(),
            StandardClassifier::Naccess | StandardClassifier::Oons => Vec::new(),
        }
    }
}

impl FromStr for StandardClassifier {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "protor" => Ok(StandardClassifier::ProtOr),
            "naccess" => Ok(StandardClassifier::Naccess),
            "oons" => Ok(StandardClassifier::Oons),
            _ => Err(ClassifierError::UnknownName(s.to_string())),
        }
    }
}

impl fmt::Display for StandardClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
