use super::build::BuildContext;
use crate::core::models::building_block::BuildingBlock;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One block to build: a label for reporting, a SMILES string and the
/// functional group names to perceive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchRequest {
    pub label: String,
    pub smiles: String,
    #[serde(default)]
    pub functional_groups: Vec<String>,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub label: String,
    pub error: EngineError,
}

/// Results in request order, split into built blocks and failures.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub built: Vec<(String, Arc<BuildingBlock>)>,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.built.len() + self.failures.len()
    }
}

/// Builds every request through `context`. A failing request is recorded in
/// [`BatchSummary::failures`] and does not stop the others.
#[instrument(skip_all, name = "batch_workflow", fields(requests = requests.len()))]
pub fn run(
    context: &BuildContext,
    requests: &[BatchRequest],
    use_cache: bool,
    reporter: &ProgressReporter,
) -> BatchSummary {
    reporter.report(Progress::BatchStart {
        total: requests.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = requests.iter();

    #[cfg(feature = "parallel")]
    let iterator = requests.par_iter();

    let results: Vec<(String, Result<Arc<BuildingBlock>, EngineError>)> = iterator
        .map(|request| {
            let result =
                context.from_smiles(&request.smiles, &request.functional_groups, use_cache);
            match &result {
                Ok(_) => reporter.report(Progress::BlockBuilt {
                    label: request.label.clone(),
                }),
                Err(e) => reporter.report(Progress::BlockFailed {
                    label: request.label.clone(),
                    reason: e.to_string(),
                }),
            }
            (request.label.clone(), result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (label, result) in results {
        match result {
            Ok(block) => summary.built.push((label, block)),
            Err(error) => {
                warn!(%label, %error, "Building block construction failed.");
                summary.failures.push(BatchFailure { label, error });
            }
        }
    }

    info!(
        built = summary.built.len(),
        failed = summary.failures.len(),
        "Batch finished."
    );
    reporter.report(Progress::BatchFinish);
    summary
}
