pub mod batch;
pub mod dump;
pub mod export;
pub mod inspect;
pub mod motifs;

use crate::cli::StructureInput;
use crate::error::{CliError, Result};
use blockforge::core::models::building_block::BuildingBlock;
use blockforge::workflows::build::BuildContext;
use std::sync::Arc;

/// Builds the single block described by `input`. Dumps keep their stored
/// functional groups, so `functional_groups` must be empty for them.
pub fn build_block(
    context: &BuildContext,
    input: &StructureInput,
    functional_groups: &[String],
) -> Result<Arc<BuildingBlock>> {
    let block = match (&input.smiles, &input.molfile, &input.dump) {
        (Some(smiles), _, _) => context.from_smiles(smiles, functional_groups, false)?,
        (_, Some(path), _) => context.from_molfile(path, functional_groups, false)?,
        (_, _, Some(path)) => {
            if !functional_groups.is_empty() {
                return Err(CliError::Argument(
                    "functional groups cannot be changed when loading a dump".to_string(),
                ));
            }
            context.load(path, false)?
        }
        (None, None, None) => {
            return Err(CliError::Argument(
                "one of --smiles, --molfile or --load is required".to_string(),
            ));
        }
    };
    Ok(block)
}
