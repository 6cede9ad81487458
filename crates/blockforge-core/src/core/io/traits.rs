use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing molecular file formats.
///
/// Implementors handle format-specific parsing and serialization; the path
/// helpers are shared.
pub trait MolecularFile {
    /// Format-specific data that does not belong to the molecule itself.
    type Metadata;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a molecule and its metadata from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the parsed molecule and the format's metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error>;

    /// Writes a molecule and metadata to a writer.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The molecule to write.
    /// * `metadata` - The metadata to include in the output.
    /// * `writer` - The writer to output to.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` on success.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the molecule cannot be expressed in the format.
    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a molecule with default metadata.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The molecule to write.
    /// * `writer` - The writer to output to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the molecule cannot be expressed in the format.
    fn write_molecule_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a molecule and its metadata from a file path.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the file to read.
    ///
    /// # Return
    ///
    /// Returns the parsed molecule and the format's metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a molecule and metadata to a file path.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The molecule to write.
    /// * `metadata` - The metadata to include in the output.
    /// * `path` - The path to the file to write.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` once the file is written and flushed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(molecule, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes a molecule with default metadata to a file path.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The molecule to write.
    /// * `path` - The path to the file to write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_molecule_to_path<P: AsRef<Path>>(
        molecule: &Molecule,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_molecule_to(molecule, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
