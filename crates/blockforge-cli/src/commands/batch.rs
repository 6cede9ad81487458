use crate::cli::BatchArgs;
use crate::config::defaults::DefaultsConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use blockforge::engine::error::EngineError;
use blockforge::engine::progress::ProgressReporter;
use blockforge::workflows::batch::{self, BatchRequest};
use blockforge::workflows::build::BuildContext;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct BatchRow {
    label: String,
    smiles: String,
    #[serde(default)]
    functional_groups: String,
}

impl From<BatchRow> for BatchRequest {
    fn from(row: BatchRow) -> Self {
        Self {
            label: row.label,
            smiles: row.smiles,
            functional_groups: row
                .functional_groups
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

fn read_requests(path: &Path) -> Result<Vec<BatchRequest>> {
    let parse_error = |e: csv::Error| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(parse_error)?;

    let mut requests = Vec::new();
    let mut seen = HashSet::new();
    for (index, row) in reader.deserialize::<BatchRow>().enumerate() {
        let row = row.map_err(parse_error)?;
        let line = index + 2;
        if !is_file_stem(&row.label) {
            return Err(CliError::FileParsing {
                path: path.to_path_buf(),
                source: anyhow::anyhow!(
                    "line {line}: label '{}' cannot be used as a file name",
                    row.label
                ),
            });
        }
        if !seen.insert(row.label.clone()) {
            warn!(label = %row.label, line, "Duplicate label; keeping the first request.");
            continue;
        }
        requests.push(row.into());
    }
    Ok(requests)
}

/// Labels name the dump files, so they must stay inside the output directory.
fn is_file_stem(label: &str) -> bool {
    !label.is_empty()
        && label != "."
        && label != ".."
        && !label.chars().any(|c| matches!(c, '/' | '\\') || c.is_control())
}

pub fn run(args: BatchArgs, context: &BuildContext) -> Result<()> {
    let defaults = DefaultsConfig::default();
    let requests = read_requests(&args.input)?;
    info!("Read {} requests from {}", requests.len(), args.input.display());
    std::fs::create_dir_all(&args.output_dir)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let use_cache = defaults.use_cache && !args.no_cache;
    let summary = batch::run(context, &requests, use_cache, &reporter);

    for (label, block) in &summary.built {
        let path = args
            .output_dir
            .join(format!("{}.{}", label, defaults.dump_extension));
        block
            .dump(&path, &[] as &[&str])
            .map_err(EngineError::from)?;
    }

    for failure in &summary.failures {
        warn!(label = %failure.label, "{}", failure.error);
    }
    println!(
        "Built {} of {} building blocks into {}",
        summary.built.len(),
        summary.total(),
        args.output_dir.display()
    );

    if summary.built.is_empty() && !summary.failures.is_empty() {
        return Err(CliError::Other(anyhow::anyhow!(
            "every request in {} failed",
            args.input.display()
        )));
    }
    Ok(())
}
