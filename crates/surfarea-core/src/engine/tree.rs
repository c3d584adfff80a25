use super::error::EngineError;
use crate::core::classifier::AtomClass;
use crate::core::models::area::{AreaBreakdown, RelativeAreaBreakdown};
use crate::core::models::structure::Structure;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct AtomNode {
    /// Canonical atom index in the structure.
    pub index: usize,
    pub name: String,
    pub area: f64,
    pub class: AtomClass,
    pub is_main_chain: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResidueNode {
    pub residue_type: String,
    pub residue_number: String,
    pub area: AreaBreakdown,
    /// Reference area of the residue type, when the classifier provides one.
    pub reference: Option<AreaBreakdown>,
    /// `area` divided field by field by `reference`.
    pub relative: Option<RelativeAreaBreakdown>,
    pub atoms: Vec<AtomNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    pub label: char,
    pub area: AreaBreakdown,
    pub residues: Vec<ResidueNode>,
    residue_index: HashMap<String, usize>,
}

impl ChainNode {
    fn new(label: char) -> Self {
        Self {
            label,
            area: AreaBreakdown::default(),
            residues: Vec::new(),
            residue_index: HashMap::new(),
        }
    }

    /// The first residue with this number.
    pub fn residue(&self, residue_number: &str) -> Option<&ResidueNode> {
        self.residue_index
            .get(residue_number.trim())
            .map(|&i| &self.residues[i])
    }
}

/// Per-atom areas organized as structure, chain, residue and atom levels.
///
/// Children keep parse order. A residue starts wherever the (chain label, residue number)
/// pair differs from the previous atom's; atoms of one chain label share a chain node even
/// when other chains come between them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTree {
    pub area: AreaBreakdown,
    pub chains: Vec<ChainNode>,
    chain_index: HashMap<char, usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ResidueRow<'a> {
    chain: char,
    residue_number: &'a str,
    residue_type: &'a str,
    total: f64,
    polar: f64,
    apolar: f64,
    main_chain: f64,
    side_chain: f64,
    relative_total: Option<f64>,
    relative_polar: Option<f64>,
    relative_apolar: Option<f64>,
    relative_main_chain: Option<f64>,
    relative_side_chain: Option<f64>,
}

impl ResultTree {
    /// Builds the tree in one pass over the atoms. `areas` must hold one value per atom.
    pub(crate) fn build(structure: &Structure, areas: &[f64]) -> Self {
        let mut tree = ResultTree::default();
        let mut previous: Option<(char, &str)> = None;

        for (index, (atom, &area)) in structure.atoms().iter().zip(areas).enumerate() {
            let chain_pos = match tree.chain_index.get(&atom.chain_label) {
                Some(&pos) => pos,
                None => {
                    tree.chains.push(ChainNode::new(atom.chain_label));
                    tree.chain_index
                        .insert(atom.chain_label, tree.chains.len() - 1);
                    tree.chains.len() - 1
                }
            };
            let chain = &mut tree.chains[chain_pos];

            let key = (atom.chain_label, atom.residue_number.as_str());
            if previous != Some(key) {
                let position = chain.residues.len();
                chain
                    .residue_index
                    .entry(atom.residue_number.clone())
                    .or_insert(position);
                chain.residues.push(ResidueNode {
                    residue_type: atom.residue_name.clone(),
                    residue_number: atom.residue_number.clone(),
                    area: AreaBreakdown::default(),
                    reference: None,
                    relative: None,
                    atoms: Vec::new(),
                });
            }
            previous = Some(key);

            let is_main_chain = atom.is_main_chain();
            if let Some(residue) = chain.residues.last_mut() {
                residue.area.add_atom(area, atom.class, is_main_chain);
                residue.atoms.push(AtomNode {
                    index,
                    name: atom.name.clone(),
                    area,
                    class: atom.class,
                    is_main_chain,
                });
            }
            chain.area.add_atom(area, atom.class, is_main_chain);
            tree.area.add_atom(area, atom.class, is_main_chain);
        }

        for residue in tree.chains.iter_mut().flat_map(|c| c.residues.iter_mut()) {
            residue.reference = structure.reference_area(&residue.residue_type).copied();
            residue.relative = residue
                .reference
                .as_ref()
                .map(|reference| residue.area.relative_to(reference));
        }
        tree
    }

    pub fn chain(&self, label: char) -> Option<&ChainNode> {
        self.chain_index.get(&label).map(|&i| &self.chains[i])
    }

    pub fn residue(&self, chain: char, residue_number: &str) -> Option<&ResidueNode> {
        self.chain(chain)?.residue(residue_number)
    }

    /// Every residue with its chain label, in tree order.
    pub fn residues(&self) -> impl Iterator<Item = (char, &ResidueNode)> {
        self.chains
            .iter()
            .flat_map(|chain| chain.residues.iter().map(move |r| (chain.label, r)))
    }

    /// Writes one CSV row per residue with absolute and, where available, relative areas.
    pub fn write_residue_csv(&self, writer: impl Write) -> Result<(), EngineError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (chain, residue) in self.residues() {
            let relative = residue.relative.as_ref();
            csv_writer.serialize(ResidueRow {
                chain,
                residue_number: &residue.residue_number,
                residue_type: &residue.residue_type,
                total: residue.area.total,
                polar: residue.area.polar,
                apolar: residue.area.apolar,
                main_chain: residue.area.main_chain,
                side_chain: residue.area.side_chain,
                relative_total: relative.map(|r| r.total),
                relative_polar: relative.map(|r| r.polar),
                relative_apolar: relative.map(|r| r.apolar),
                relative_main_chain: relative.map(|r| r.main_chain),
                relative_side_chain: relative.map(|r| r.side_chain),
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::fixtures::{SMALL_PROTEIN, TWO_MODELS_TWO_CHAINS};
    use crate::core::models::options::StructureOptions;
    use nalgebra::Point3;
    use std::io::Cursor;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn residues_group_consecutive_atoms() {
        let mut structure = Structure::new();
        structure.add_atom("CA", "ALA", 1, 'A', Point3::origin()).unwrap();
        structure.add_atom("CA", "ALA", 2, 'A', Point3::origin()).unwrap();
        structure.add_atom("CB", "ALA", 2, 'A', Point3::origin()).unwrap();

        let tree = ResultTree::build(&structure, &[5.0, 1.0, 2.0]);
        let residue = tree.residue('A', "2").unwrap();
        assert_eq!(residue.area.total, 3.0);
        assert_eq!(residue.area.main_chain, 1.0);
        assert_eq!(residue.area.side_chain, 2.0);
        assert_eq!(residue.atoms.len(), 2);
        assert_eq!(tree.chain('A').unwrap().residues.len(), 2);
        assert_eq!(tree.area.total, 8.0);
    }

    #[test]
    fn residue_breakdowns_are_consistent() {
        let structure =
            Structure::from_reader(Cursor::new(SMALL_PROTEIN), None, &StructureOptions::default())
                .unwrap();
        let areas: Vec<f64> = (0..structure.n_atoms()).map(|i| 0.1 + i as f64 * 3.7).collect();
        let tree = ResultTree::build(&structure, &areas);

        for (_, residue) in tree.residues() {
            assert_eq!(residue.area.unknown, 0.0);
            assert_close(residue.area.total, residue.area.polar + residue.area.apolar);
            assert_close(
                residue.area.total,
                residue.area.main_chain + residue.area.side_chain,
            );
        }
        assert_close(tree.area.total, areas.iter().sum());
    }

    #[test]
    fn relative_areas_use_reference_and_allow_nan() {
        let structure =
            Structure::from_reader(Cursor::new(SMALL_PROTEIN), None, &StructureOptions::default())
                .unwrap();
        let areas = vec![1.0; structure.n_atoms()];
        let tree = ResultTree::build(&structure, &areas);

        let ala = tree.residue('A', "1").unwrap();
        let reference = ala.reference.unwrap();
        let relative = ala.relative.unwrap();
        assert_close(relative.total, ala.area.total / reference.total);

        let gly = tree.residue('A', "2").unwrap();
        let relative = gly.relative.unwrap();
        assert_eq!(gly.area.side_chain, 0.0);
        assert!(relative.side_chain.is_nan());
        assert!(relative.total.is_finite());
    }

    #[test]
    fn residues_without_reference_have_no_relative_area() {
        let options = StructureOptions {
            include_hetatm: true,
            ..Default::default()
        };
        let structure = Structure::from_reader(Cursor::new(SMALL_PROTEIN), None, &options).unwrap();
        let tree = ResultTree::build(&structure, &vec![1.0; structure.n_atoms()]);
        let water = tree.residue('A', "101").unwrap();
        assert!(water.reference.is_none());
        assert!(water.relative.is_none());
    }

    #[test]
    fn chains_merge_by_label_in_first_seen_order() {
        let options = StructureOptions {
            join_models: true,
            ..Default::default()
        };
        let structure =
            Structure::from_reader(Cursor::new(TWO_MODELS_TWO_CHAINS), None, &options).unwrap();
        let tree = ResultTree::build(&structure, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let labels: Vec<char> = tree.chains.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!['A', 'B']);
        let chain_a = tree.chain('A').unwrap();
        assert_eq!(chain_a.residues.len(), 2);
        assert_eq!(chain_a.area.total, 1.0 + 2.0 + 4.0 + 5.0);
        assert_eq!(chain_a.residue("1").unwrap().area.total, 3.0);
        assert!(tree.chain('C').is_none());
    }

    #[test]
    fn write_residue_csv_emits_one_row_per_residue() {
        let structure =
            Structure::from_reader(Cursor::new(SMALL_PROTEIN), None, &StructureOptions::default())
                .unwrap();
        let tree = ResultTree::build(&structure, &vec![2.0; structure.n_atoms()]);

        let mut buffer = Vec::new();
        tree.write_residue_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("chain,residue-number,residue-type,total"));
        assert!(lines[1].starts_with("A,1,ALA,10.0"));
        assert!(lines[2].starts_with("A,2,GLY,8.0"));
    }

    struct Unwritable;

    impl Write for Unwritable {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_residue_csv_reports_writer_failures_as_io() {
        let structure =
            Structure::from_reader(Cursor::new(SMALL_PROTEIN), None, &StructureOptions::default())
                .unwrap();
        let tree = ResultTree::build(&structure, &vec![2.0; structure.n_atoms()]);

        let err = tree.write_residue_csv(Unwritable).unwrap_err();
        assert!(matches!(err, EngineError::Io(ref e) if e.to_string() == "disk full"));
    }
}
