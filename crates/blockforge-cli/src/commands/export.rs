use super::build_block;
use crate::cli::ExportArgs;
use crate::error::Result;
use blockforge::core::io::molfile::{MolFile, MolMetadata};
use blockforge::core::io::traits::MolecularFile;
use blockforge::engine::error::EngineError;
use blockforge::workflows::build::BuildContext;
use tracing::info;

pub fn run(args: ExportArgs, context: &BuildContext) -> Result<()> {
    let block = build_block(context, &args.input, &[])?;
    let metadata = MolMetadata {
        name: args.name.unwrap_or_default(),
        program: format!("bforge {}", env!("CARGO_PKG_VERSION")),
        comment: String::new(),
    };

    MolFile::write_to_path(block.molecule(), &metadata, &args.output)
        .map_err(EngineError::from)?;
    info!(
        atoms = block.molecule().atom_count(),
        "Molfile written to {}",
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, smiles};
    use tempfile::tempdir;

    #[test]
    fn exported_molfile_reads_back_with_the_same_graph() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("acid.mol");
        let args = ExportArgs {
            input: smiles("OC(=O)CC"),
            output: output.clone(),
            name: Some("propanoic acid".to_string()),
        };
        let context = context();

        run(args, &context).unwrap();

        let (molecule, metadata) = MolFile::read_from_path(&output).unwrap();
        let original = context.from_smiles("OC(=O)CC", &[] as &[&str], false).unwrap();
        assert_eq!(metadata.name, "propanoic acid");
        assert_eq!(molecule.structural_key(), original.molecule().structural_key());
    }
}
