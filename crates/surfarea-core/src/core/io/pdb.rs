use crate::core::io::traits::RecordFile;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

/// One `ATOM`/`HETATM` record, with names and numbers trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAtom {
    pub name: String,
    pub residue_name: String,
    /// Sequence number with the insertion code appended (e.g. "52A").
    pub residue_number: String,
    pub chain_label: char,
    pub coord: Point3<f64>,
    pub is_hetero: bool,
    /// 1-based position of the enclosing `MODEL` block; 1 when the file has none.
    pub model: usize,
    pub element: Option<String>,
    pub alt_location: Option<char>,
    pub occupancy: f64,
    pub b_factor: f64,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| *c != ' ')
}

fn parse_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    default: Option<f64>,
) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    if value.is_empty() {
        if let Some(default) = default {
            return Ok(default);
        }
    }
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

fn required<'a>(
    line: &'a str,
    line_num: usize,
    start: usize,
    end: usize,
) -> Result<&'a str, PdbError> {
    let value = slice_and_trim(line, start, end);
    if value.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: format!("{}-{}", start + 1, end),
            },
        });
    }
    Ok(value)
}

/// Fixed-column PDB atom records.
///
/// Only the first alternate location (blank or `A`) of each atom is kept, and reading
/// stops at the first `END` record.
pub struct PdbFile;

impl RecordFile for PdbFile {
    type Record = ParsedAtom;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<ParsedAtom>, PdbError> {
        let mut atoms = Vec::new();
        let mut models_seen = 0usize;

        for (index, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = index + 1;
            let record = line.get(0..6).unwrap_or(&line).trim_end();

            match record {
                "MODEL" => models_seen += 1,
                "END" => break,
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let alt_location = column_char(&line, 16);
                    if matches!(alt_location, Some(alt) if alt != 'A') {
                        continue;
                    }

                    let name = required(&line, line_num, 12, 16)?;
                    let sequence = required(&line, line_num, 22, 26)?;
                    let residue_number = match column_char(&line, 26) {
                        Some(icode) => format!("{}{}", sequence, icode),
                        None => sequence.to_string(),
                    };
                    let coord = Point3::new(
                        parse_float(&line, line_num, 30, 38, None)?,
                        parse_float(&line, line_num, 38, 46, None)?,
                        parse_float(&line, line_num, 46, 54, None)?,
                    );
                    let element = Some(slice_and_trim(&line, 76, 78))
                        .filter(|e| !e.is_empty())
                        .map(str::to_string);

                    atoms.push(ParsedAtom {
                        name: name.to_string(),
                        residue_name: slice_and_trim(&line, 17, 20).to_string(),
                        residue_number,
                        chain_label: column_char(&line, 21).unwrap_or(' '),
                        coord,
                        is_hetero: record == "HETATM",
                        model: models_seen.max(1),
                        element,
                        alt_location,
                        occupancy: parse_float(&line, line_num, 54, 60, Some(1.0))?,
                        b_factor: parse_float(&line, line_num, 60, 66, Some(0.0))?,
                    });
                }
                _ => {}
            }
        }

        Ok(atoms)
    }
}

/// One rendered `ATOM`/`HETATM` line.
pub(crate) struct AtomLine<'a> {
    pub serial: usize,
    pub name: &'a str,
    pub residue_name: &'a str,
    pub residue_number: &'a str,
    pub chain_label: char,
    pub coord: &'a Point3<f64>,
    pub is_hetero: bool,
    pub occupancy: f64,
    pub b_factor: f64,
    pub element: Option<&'a str>,
}

impl AtomLine<'_> {
    pub fn render(&self) -> String {
        let record = if self.is_hetero { "HETATM" } else { "ATOM" };
        let name = if self.name.len() < 4 {
            format!(" {}", self.name)
        } else {
            self.name.to_string()
        };
        let (sequence, icode) = split_insertion_code(self.residue_number);
        format!(
            "{:<6}{:>5} {:<4}{:1}{:>3} {:1}{:>4}{:1}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record,
            self.serial % 100_000,
            name,
            ' ',
            self.residue_name,
            self.chain_label,
            sequence,
            icode,
            self.coord.x,
            self.coord.y,
            self.coord.z,
            self.occupancy,
            self.b_factor,
            self.element.unwrap_or(""),
        )
    }
}

fn split_insertion_code(residue_number: &str) -> (&str, char) {
    match residue_number.char_indices().last() {
        Some((index, c)) if index > 0 && c.is_ascii_alphabetic() => {
            (&residue_number[..index], c)
        }
        _ => (residue_number, ' '),
    }
}

/// Range the six-character occupancy and B-factor columns hold at two decimals.
const MIN_COLUMN_VALUE: f64 = -99.99;
const MAX_COLUMN_VALUE: f64 = 999.99;

fn check_column(value: f64, column: &str, index: usize) -> Result<(), PdbError> {
    // Rounding to two decimals must not need a seventh character.
    let rounded = (value * 100.0).round() / 100.0;
    if !value.is_finite() || !(MIN_COLUMN_VALUE..=MAX_COLUMN_VALUE).contains(&rounded) {
        return Err(PdbError::Inconsistency(format!(
            "{} {} of atom {} does not fit a six-character column",
            column, value, index
        )));
    }
    Ok(())
}

/// Writes one line per atom with its radius in the occupancy column and its area in the
/// B-factor column, followed by `END`.
///
/// Both columns hold two decimals, so areas read back by [`read_areas`] are rounded to
/// 0.01 Å². Values outside `-99.99..=999.99` do not fit the fixed-width columns and are
/// rejected with [`PdbError::Inconsistency`] before anything is written.
pub fn write_areas(
    structure: &Structure,
    areas: &[f64],
    writer: &mut impl Write,
) -> Result<(), PdbError> {
    if areas.len() != structure.n_atoms() {
        return Err(PdbError::Inconsistency(format!(
            "{} areas for {} atoms",
            areas.len(),
            structure.n_atoms()
        )));
    }

    for (index, (radius, area)) in structure.radii().iter().zip(areas).enumerate() {
        check_column(*radius, "radius", index)?;
        check_column(*area, "area", index)?;
    }

    let columns = structure
        .atoms()
        .iter()
        .zip(structure.coords())
        .zip(structure.radii())
        .zip(areas);
    for (index, (((atom, coord), radius), area)) in columns.enumerate() {
        let line = AtomLine {
            serial: index + 1,
            name: &atom.name,
            residue_name: &atom.residue_name,
            residue_number: &atom.residue_number,
            chain_label: atom.chain_label,
            coord,
            is_hetero: atom.is_hetero,
            occupancy: *radius,
            b_factor: *area,
            element: atom.element.as_deref(),
        };
        writeln!(writer, "{}", line.render())?;
    }
    writeln!(writer, "END")?;
    Ok(())
}

/// Reads back the per-atom areas stored in the B-factor column by [`write_areas`].
pub fn read_areas(reader: &mut impl BufRead) -> Result<Vec<f64>, PdbError> {
    Ok(PdbFile::read_from(reader)?
        .into_iter()
        .map(|atom| atom.b_factor)
        .collect())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::io::Cursor;

    fn read(content: &str) -> Vec<ParsedAtom> {
        PdbFile::read_from(&mut Cursor::new(content)).unwrap()
    }

    #[test]
    fn read_from_parses_atom_and_hetatm_records() {
        let atoms = read(SMALL_PROTEIN);
        assert_eq!(atoms.len(), 11);

        let ca = &atoms[1];
        assert_eq!(ca.name, "CA");
        assert_eq!(ca.residue_name, "ALA");
        assert_eq!(ca.residue_number, "1");
        assert_eq!(ca.chain_label, 'A');
        assert_eq!(ca.coord, Point3::new(26.266, 25.413, 2.842));
        assert_eq!(ca.element.as_deref(), Some("C"));
        assert_eq!(ca.model, 1);
        assert!(!ca.is_hetero);
        assert_eq!(ca.b_factor, 10.38);

        let water = &atoms[10];
        assert!(water.is_hetero);
        assert_eq!(water.residue_number, "101");
    }

    #[test]
    fn read_from_numbers_models_sequentially() {
        let atoms = read(TWO_MODELS_TWO_CHAINS);
        assert_eq!(atoms.len(), 6);
        assert!(atoms[..3].iter().all(|a| a.model == 1));
        assert!(atoms[3..].iter().all(|a| a.model == 2));
        assert_eq!(atoms[2].chain_label, 'B');
    }

    #[test]
    fn read_from_keeps_first_alternate_location_and_insertion_code() {
        let atoms = read(ALTERNATE_LOCATIONS);
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].alt_location, Some('A'));
        assert_eq!(atoms[0].residue_number, "52A");
    }

    #[test]
    fn read_from_stops_at_end_record() {
        let content = format!("{}ATOM      1  CA  ALA A   9       0.000   0.000   0.000\n", SMALL_PROTEIN);
        assert_eq!(read(&content).len(), 11);
    }

    #[test]
    fn read_from_reports_short_lines() {
        let err = PdbFile::read_from(&mut Cursor::new("ATOM      1  CA  ALA A   1\n")).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort
            }
        ));
    }

    #[test]
    fn read_from_reports_bad_coordinates() {
        let content =
            "ATOM      1  CA  ALA A   1       0.000   abcde   0.000  1.00  0.00           C\n";
        let err = PdbFile::read_from(&mut Cursor::new(content)).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                kind: PdbParseErrorKind::InvalidFloat { .. },
                ..
            }
        ));
    }

    #[test]
    fn read_from_path_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdbFile::read_from_path(dir.path().join("missing.pdb")).unwrap_err();
        assert!(matches!(err, PdbError::Io(_)));
    }

    #[test]
    fn atom_line_renders_fixed_columns() {
        let coord = Point3::new(26.266, 25.413, 2.842);
        let line = AtomLine {
            serial: 2,
            name: "CA",
            residue_name: "ALA",
            residue_number: "1",
            chain_label: 'A',
            coord: &coord,
            is_hetero: false,
            occupancy: 1.0,
            b_factor: 10.38,
            element: Some("C"),
        }
        .render();
        assert_eq!(line, SMALL_PROTEIN.lines().nth(1).unwrap());
    }

    #[test]
    fn atom_line_splits_insertion_codes() {
        let coord = Point3::origin();
        let line = AtomLine {
            serial: 1,
            name: "CA",
            residue_name: "SER",
            residue_number: "52A",
            chain_label: 'A',
            coord: &coord,
            is_hetero: false,
            occupancy: 1.0,
            b_factor: 0.0,
            element: Some("C"),
        }
        .render();
        assert_eq!(&line[22..27], "  52A");
    }

    #[test]
    fn write_areas_round_trips_through_read_areas() {
        let structure = Structure::from_reader(
            Cursor::new(SMALL_PROTEIN),
            None,
            &Default::default(),
        )
        .unwrap();
        let areas: Vec<f64> = (0..structure.n_atoms()).map(|i| i as f64 * 1.25).collect();

        let mut buffer = Vec::new();
        write_areas(&structure, &areas, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with("END\n"));

        let parsed = read(&text);
        assert_eq!(parsed.len(), structure.n_atoms());
        assert_eq!(parsed[1].occupancy, 1.88);
        assert_eq!(read_areas(&mut Cursor::new(text.as_str())).unwrap(), areas);
    }

    #[test]
    fn write_areas_rejects_mismatched_lengths() {
        let structure = Structure::from_reader(
            Cursor::new(SMALL_PROTEIN),
            None,
            &Default::default(),
        )
        .unwrap();
        let err = write_areas(&structure, &[1.0], &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PdbError::Inconsistency(_)));
    }

    #[test]
    fn write_areas_rejects_areas_wider_than_the_column() {
        let structure = Structure::from_reader(
            Cursor::new(SMALL_PROTEIN),
            None,
            &Default::default(),
        )
        .unwrap();
        let mut areas = vec![1.0; structure.n_atoms()];
        areas[3] = 999.99;
        let mut buffer = Vec::new();
        write_areas(&structure, &areas, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(read_areas(&mut Cursor::new(text.as_str())).unwrap()[3], 999.99);

        areas[3] = 1234.5;
        let mut buffer = Vec::new();
        let err = write_areas(&structure, &areas, &mut buffer).unwrap_err();
        assert!(matches!(err, PdbError::Inconsistency(ref msg) if msg.contains("atom 3")));
        assert!(buffer.is_empty());
    }

    #[test]
    fn write_areas_rounds_to_two_decimals() {
        let structure = Structure::from_reader(
            Cursor::new(SMALL_PROTEIN),
            None,
            &Default::default(),
        )
        .unwrap();
        let areas = vec![12.3456; structure.n_atoms()];
        let mut buffer = Vec::new();
        write_areas(&structure, &areas, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(
            read_areas(&mut Cursor::new(text.as_str()))
                .unwrap()
                .iter()
                .all(|a| *a == 12.35)
        );
    }
}
