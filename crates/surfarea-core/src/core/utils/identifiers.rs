use phf::{Set, phf_set};

static MAIN_CHAIN_ATOM_NAMES: Set<&'static str> = phf_set! {
    // protein backbone
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3", "NT",
    "HT1", "HT2", "HT3", "OT1", "OT2", "HC", "HOXT", "HA1", "HA2", "1HA", "2HA",
    // nucleic acid backbone
    "P", "OP1", "OP2", "OP3", "O1P", "O2P", "O3P", "O5'", "C5'", "C4'", "O4'",
    "C3'", "O3'", "C2'", "O2'", "C1'", "H5'", "H5''", "H4'", "H3'", "H2'", "H2''",
    "H1'", "HO2'", "HO3'", "HO5'",
};

/// Whether an atom belongs to the main chain (backbone) rather than a side chain.
pub fn is_main_chain_atom(atom_name: &str) -> bool {
    MAIN_CHAIN_ATOM_NAMES.contains(atom_name.trim())
}

/// Whether an atom is a hydrogen or deuterium.
///
/// The element symbol wins when present; otherwise the first letter of the atom name
/// decides, skipping leading digits as in `1HB`.
pub fn is_hydrogen(atom_name: &str, element: Option<&str>) -> bool {
    if let Some(element) = element.map(str::trim).filter(|e| !e.is_empty()) {
        return element.eq_ignore_ascii_case("H") || element.eq_ignore_ascii_case("D");
    }
    let first_letter = atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());
    matches!(first_letter, Some('H') | Some('D'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_main_chain_atom_recognizes_protein_backbone() {
        assert!(is_main_chain_atom("N"));
        assert!(is_main_chain_atom("CA"));
        assert!(is_main_chain_atom("C"));
        assert!(is_main_chain_atom("O"));
        assert!(is_main_chain_atom("OXT"));
    }

    #[test]
    fn is_main_chain_atom_recognizes_nucleic_backbone() {
        assert!(is_main_chain_atom("P"));
        assert!(is_main_chain_atom("O5'"));
        assert!(is_main_chain_atom("C1'"));
    }

    #[test]
    fn is_main_chain_atom_trims_whitespace_and_is_case_sensitive() {
        assert!(is_main_chain_atom(" CA "));
        assert!(!is_main_chain_atom("ca"));
    }

    #[test]
    fn is_main_chain_atom_returns_false_for_side_chain_atoms() {
        assert!(!is_main_chain_atom("CB"));
        assert!(!is_main_chain_atom("SG"));
        assert!(!is_main_chain_atom(""));
    }

    #[test]
    fn is_hydrogen_prefers_the_element_symbol() {
        assert!(is_hydrogen("X1", Some("H")));
        assert!(!is_hydrogen("HG", Some("HG")));
        assert!(is_hydrogen("D2", Some(" D")));
    }

    #[test]
    fn is_hydrogen_falls_back_to_the_atom_name() {
        assert!(is_hydrogen("H", None));
        assert!(is_hydrogen(" HA ", None));
        assert!(is_hydrogen("1HB", None));
        assert!(is_hydrogen("D2", Some("")));
        assert!(!is_hydrogen("CA", None));
        assert!(!is_hydrogen("N", None));
    }
}
