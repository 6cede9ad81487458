use super::build_block;
use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use blockforge::workflows::build::BuildContext;
use blockforge::workflows::report::BlockReport;
use tracing::info;

pub fn run(args: InspectArgs, context: &BuildContext) -> Result<()> {
    let block = build_block(context, &args.input, &args.functional_groups)?;
    let report = BlockReport::new(&block);
    let text = toml::to_string(&report).map_err(|e| CliError::Other(e.into()))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("Report written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, smiles};
    use tempfile::tempdir;

    #[test]
    fn report_is_written_to_the_output_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("report.toml");
        let args = InspectArgs {
            input: smiles("NCCCN"),
            functional_groups: vec!["amine".to_string()],
            output: Some(output.clone()),
        };

        run(args, &context()).unwrap();

        let table: toml::Table = toml::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(table["atom_count"].as_integer(), Some(15));
        assert_eq!(table["functional_groups"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_motifs_fail_the_command() {
        let args = InspectArgs {
            input: smiles("NCCCN"),
            functional_groups: vec!["nitrene".to_string()],
            output: None,
        };
        assert!(matches!(run(args, &context()), Err(CliError::Core(_))));
    }
}
