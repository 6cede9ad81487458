use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::{Molecule, MoleculeError};
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// The three header lines of a molfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MolMetadata {
    pub name: String,
    pub program: String,
    pub comment: String,
}

#[derive(Debug, Error)]
pub enum MolFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: MolParseErrorKind,
    },
    #[error("Unsupported molfile version '{0}'; only V2000 is supported")]
    UnsupportedVersion(String),
    #[error("Molfile ended before the {0} was complete")]
    UnexpectedEof(&'static str),
    #[error("Invalid molecular graph: {0}")]
    Molecule(#[from] MoleculeError),
    #[error("Molecule with {0} atoms exceeds the V2000 limit of 999")]
    TooLarge(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MolParseErrorKind {
    #[error("Invalid integer in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("Unsupported bond type {0}")]
    UnsupportedBondType(u8),
    #[error("Bond references atom {0}, which is not in the atom block")]
    AtomOutOfRange(usize),
    #[error("Malformed property line")]
    MalformedProperty,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_int<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
) -> Result<T, MolFileError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| MolFileError::Parse {
        line: line_num,
        kind: MolParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, MolFileError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| MolFileError::Parse {
        line: line_num,
        kind: MolParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

/// Atom block charge codes map to formal charges 3..-3; 4 is a doublet radical.
fn charge_from_code(code: u8) -> i8 {
    match code {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn code_from_charge(charge: i8) -> u8 {
    match charge {
        3 => 1,
        2 => 2,
        1 => 3,
        -1 => 5,
        -2 => 6,
        -3 => 7,
        _ => 0,
    }
}

/// MDL molfile, V2000 connection table.
pub struct MolFile;

impl MolecularFile for MolFile {
    type Metadata = MolMetadata;
    type Error = MolFileError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let mut lines = reader.lines().enumerate();
        let mut next_line = |section: &'static str| -> Result<(usize, String), MolFileError> {
            match lines.next() {
                Some((index, line)) => Ok((index + 1, line?)),
                None => Err(MolFileError::UnexpectedEof(section)),
            }
        };

        let metadata = MolMetadata {
            name: next_line("header")?.1.trim_end().to_string(),
            program: next_line("header")?.1.trim_end().to_string(),
            comment: next_line("header")?.1.trim_end().to_string(),
        };

        let (counts_num, counts) = next_line("counts line")?;
        let version = slice_and_trim(&counts, 33, 39);
        if !version.is_empty() && version != "V2000" {
            return Err(MolFileError::UnsupportedVersion(version.to_string()));
        }
        let num_atoms: usize = parse_int(&counts, counts_num, 0, 3)?;
        let num_bonds: usize = parse_int(&counts, counts_num, 3, 6)?;

        let mut atoms = Vec::with_capacity(num_atoms);
        let mut positions = Vec::with_capacity(num_atoms);
        for _ in 0..num_atoms {
            let (line_num, line) = next_line("atom block")?;
            let x = parse_float(&line, line_num, 0, 10)?;
            let y = parse_float(&line, line_num, 10, 20)?;
            let z = parse_float(&line, line_num, 20, 30)?;
            let symbol = slice_and_trim(&line, 31, 34);
            let element: Element = symbol.parse().map_err(|_| MolFileError::Parse {
                line: line_num,
                kind: MolParseErrorKind::UnknownElement(symbol.to_string()),
            })?;
            let charge_code: u8 = if slice_and_trim(&line, 36, 39).is_empty() {
                0
            } else {
                parse_int(&line, line_num, 36, 39)?
            };
            atoms.push(Atom::with_charge(element, charge_from_code(charge_code)));
            positions.push(Point3::new(x, y, z));
        }

        let mut bonds = Vec::with_capacity(num_bonds);
        for _ in 0..num_bonds {
            let (line_num, line) = next_line("bond block")?;
            let atom1: usize = parse_int(&line, line_num, 0, 3)?;
            let atom2: usize = parse_int(&line, line_num, 3, 6)?;
            let code: u8 = parse_int(&line, line_num, 6, 9)?;
            let order = BondOrder::from_molfile_code(code).ok_or(MolFileError::Parse {
                line: line_num,
                kind: MolParseErrorKind::UnsupportedBondType(code),
            })?;
            for atom in [atom1, atom2] {
                if atom == 0 || atom > num_atoms {
                    return Err(MolFileError::Parse {
                        line: line_num,
                        kind: MolParseErrorKind::AtomOutOfRange(atom),
                    });
                }
            }
            bonds.push(Bond::new(atom1 - 1, atom2 - 1, order));
        }

        // Any M  CHG line resets every charge given in the atom block.
        let mut property_charges: Option<HashMap<usize, i8>> = None;
        while let Some((index, line)) = lines.next() {
            let line = line?;
            let line_num = index + 1;
            if line.starts_with("M  END") || line.starts_with("$$$$") {
                break;
            }
            if line.starts_with("M  CHG") {
                let charges = property_charges.get_or_insert_with(HashMap::new);
                let fields: Vec<&str> = line[6..].split_whitespace().collect();
                let malformed = || MolFileError::Parse {
                    line: line_num,
                    kind: MolParseErrorKind::MalformedProperty,
                };
                let count: usize = fields.first().and_then(|f| f.parse().ok()).ok_or_else(malformed)?;
                if fields.len() < 1 + 2 * count {
                    return Err(malformed());
                }
                for pair in fields[1..1 + 2 * count].chunks(2) {
                    let atom: usize = pair[0].parse().map_err(|_| malformed())?;
                    let charge: i8 = pair[1].parse().map_err(|_| malformed())?;
                    if atom == 0 || atom > num_atoms {
                        return Err(MolFileError::Parse {
                            line: line_num,
                            kind: MolParseErrorKind::AtomOutOfRange(atom),
                        });
                    }
                    charges.insert(atom - 1, charge);
                }
            }
        }
        if let Some(charges) = property_charges {
            for (index, atom) in atoms.iter_mut().enumerate() {
                atom.charge = charges.get(&index).copied().unwrap_or(0);
            }
        }

        let molecule = Molecule::new(atoms, bonds, positions)?;
        Ok((molecule, metadata))
    }

    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        if molecule.atom_count() > 999 || molecule.bond_count() > 999 {
            return Err(MolFileError::TooLarge(molecule.atom_count()));
        }

        writeln!(writer, "{}", metadata.name)?;
        writeln!(writer, "{}", metadata.program)?;
        writeln!(writer, "{}", metadata.comment)?;
        writeln!(
            writer,
            "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
            molecule.atom_count(),
            molecule.bond_count()
        )?;

        for (atom, position) in molecule.atoms().iter().zip(molecule.position_matrix()) {
            writeln!(
                writer,
                "{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}  0  0  0  0  0  0  0  0  0  0",
                position.x,
                position.y,
                position.z,
                atom.element.symbol(),
                code_from_charge(atom.charge)
            )?;
        }

        for bond in molecule.bonds() {
            writeln!(
                writer,
                "{:>3}{:>3}{:>3}  0",
                bond.atom1 + 1,
                bond.atom2 + 1,
                bond.order.molfile_code()
            )?;
        }

        let charged: Vec<(usize, i8)> = molecule
            .atoms()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.charge != 0)
            .map(|(i, a)| (i + 1, a.charge))
            .collect();
        for chunk in charged.chunks(8) {
            write!(writer, "M  CHG{:>3}", chunk.len())?;
            for (atom, charge) in chunk {
                write!(writer, " {:>3} {:>3}", atom, charge)?;
            }
            writeln!(writer)?;
        }
        writeln!(writer, "M  END")?;
        Ok(())
    }

    fn write_molecule_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error> {
        let metadata = MolMetadata {
            name: String::new(),
            program: format!("  blockforge {}", env!("CARGO_PKG_VERSION")),
            comment: String::new(),
        };
        Self::write_to(molecule, &metadata, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::smiles;
    use std::io::Cursor;
    use tempfile::tempdir;

    const ACETATE: &str = "\
acetate
  hand-written
test molecule
  4  3  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000    1.0400    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000   -1.0400    0.0000 O   0  5  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  2  0
  2  4  1  0
M  END
";

    fn read(content: &str) -> Result<(Molecule, MolMetadata), MolFileError> {
        MolFile::read_from(&mut Cursor::new(content))
    }

    #[test]
    fn reads_header_atoms_bonds_and_charges() {
        let (molecule, metadata) = read(ACETATE).unwrap();
        assert_eq!(metadata.name, "acetate");
        assert_eq!(metadata.comment, "test molecule");
        assert_eq!(molecule.atom_count(), 4);
        assert_eq!(molecule.bond_count(), 3);
        assert_eq!(molecule.atoms()[3].charge, -1);
        assert_eq!(molecule.bond_between(1, 2).unwrap().order, BondOrder::Double);
        assert!((molecule.position(1).unwrap().x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn charge_property_overrides_atom_block() {
        let content = ACETATE.replace("M  END", "M  CHG  1   3   1\nM  END");
        let (molecule, _) = read(&content).unwrap();
        assert_eq!(molecule.atoms()[2].charge, 1);
        assert_eq!(molecule.atoms()[3].charge, 0);
    }

    #[test]
    fn round_trip_preserves_topology_charges_and_coordinates() {
        let mut molecule = smiles::parse("C[NH3+]").unwrap();
        let positions = (0..molecule.atom_count())
            .map(|i| Point3::new(i as f64, -(i as f64) * 0.5, 0.25))
            .collect();
        molecule.set_position_matrix(positions).unwrap();

        let mut buffer = Vec::new();
        MolFile::write_molecule_to(&molecule, &mut buffer).unwrap();
        let (read_back, _) = read(std::str::from_utf8(&buffer).unwrap()).unwrap();

        assert_eq!(read_back.structural_key(), molecule.structural_key());
        for (a, b) in read_back.position_matrix().iter().zip(molecule.position_matrix()) {
            assert!((a - b).norm() < 1e-4);
        }
    }

    #[test]
    fn path_helpers_write_and_read_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mol.mol");
        let molecule = smiles::parse("O=CC=O").unwrap();
        let metadata = MolMetadata {
            name: "glyoxal".into(),
            ..Default::default()
        };
        MolFile::write_to_path(&molecule, &metadata, &path).unwrap();
        let (read_back, meta) = MolFile::read_from_path(&path).unwrap();
        assert_eq!(meta.name, "glyoxal");
        assert_eq!(read_back.atom_count(), molecule.atom_count());
    }

    #[test]
    fn truncated_file_reports_missing_section() {
        let truncated: String = ACETATE.lines().take(6).map(|l| format!("{l}\n")).collect();
        assert!(matches!(
            read(&truncated),
            Err(MolFileError::UnexpectedEof("atom block"))
        ));
    }

    #[test]
    fn bad_fields_are_reported_with_line_numbers() {
        let bad_element = ACETATE.replace(" O   0  5", " Qq  0  5");
        assert!(matches!(
            read(&bad_element),
            Err(MolFileError::Parse {
                line: 8,
                kind: MolParseErrorKind::UnknownElement(_)
            })
        ));

        let bad_bond = ACETATE.replace("  2  4  1  0", "  2  9  1  0");
        assert!(matches!(
            read(&bad_bond),
            Err(MolFileError::Parse {
                kind: MolParseErrorKind::AtomOutOfRange(9),
                ..
            })
        ));

        let v3000 = ACETATE.replace("V2000", "V3000");
        assert!(matches!(
            read(&v3000),
            Err(MolFileError::UnsupportedVersion(v)) if v == "V3000"
        ));
    }
}
