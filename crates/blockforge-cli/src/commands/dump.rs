use super::build_block;
use crate::cli::DumpArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use blockforge::workflows::build::BuildContext;
use blockforge::engine::error::EngineError;
use tracing::info;

pub fn run(args: DumpArgs, context: &BuildContext) -> Result<()> {
    let attributes = args
        .attributes
        .iter()
        .map(|a| parser::parse_attribute(a).map_err(|e| CliError::Argument(e.to_string())))
        .collect::<Result<Vec<_>>>()?;

    let mut block = build_block(context, &args.input, &args.functional_groups)?
        .as_ref()
        .clone();

    let mut include: Vec<String> = Vec::with_capacity(attributes.len());
    for (name, value) in attributes {
        block.set_attribute(&name, value);
        if !include.contains(&name) {
            include.push(name);
        }
    }

    block
        .dump(&args.output, &include)
        .map_err(EngineError::from)?;
    info!(
        groups = block.num_functional_groups(),
        attributes = include.len(),
        "Dump written to {}",
        args.output.display()
    );
    Ok(())
}
