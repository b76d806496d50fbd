//! Orchestration of the fan-out/fan-in aggregation run.
//!
//! Shutdown happens in two stages. The dispatcher drops the only
//! distribution sender when input runs out, which lets every worker drain
//! and exit. The supervisor joins the workers and then drops the last
//! results sender, which ends the merge loop on the calling thread.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread;

use crossbeam_channel::bounded;
use tracing::{debug, error, info};

use crate::aggregate::merge_results;
use crate::config::PipelineConfig;
use crate::dispatcher::dispatch;
use crate::error::{PipelineError, Result};
use crate::parser::MovementRecord;
use crate::stats::{FinalResult, PartialResult};
use crate::worker::run_worker;

/// Opens `path` and runs [`process`] over its lines.
///
/// # Errors
///
/// Fails with [`PipelineError::InputOpen`] before any thread starts if the
/// file cannot be opened.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn process_file(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<FinalResult> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PipelineError::InputOpen {
        path: path.to_path_buf(),
        source,
    })?;

    process(BufReader::new(file), config)
}

/// Aggregates every movement in `reader` using a fixed worker pool.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the config is rejected, and
/// a panic error if a pipeline thread died, since its records are lost.
#[tracing::instrument(skip_all, fields(workers = config.workers))]
pub fn process<R>(reader: R, config: &PipelineConfig) -> Result<FinalResult>
where
    R: BufRead + Send + 'static,
{
    config.validate()?;

    let (movement_tx, movement_rx) = bounded::<MovementRecord>(config.channel_capacity);
    // Each worker sends once, so this never blocks a worker
    let (result_tx, result_rx) = bounded::<PartialResult>(config.workers);

    let worker_handles: Vec<_> = (1..=config.workers)
        .map(|worker_id| {
            let movements = movement_rx.clone();
            let results = result_tx.clone();
            let handle = thread::spawn(move || run_worker(worker_id, movements, results));
            (worker_id, handle)
        })
        .collect();
    drop(movement_rx);

    let dispatcher = thread::spawn(move || dispatch(reader, movement_tx));

    let supervisor = thread::spawn(move || -> Result<()> {
        debug!("Waiting for workers");
        let mut outcome = Ok(());

        for (worker_id, handle) in worker_handles {
            if handle.join().is_err() {
                error!(worker_id, "Worker panicked");
                if outcome.is_ok() {
                    outcome = Err(PipelineError::WorkerPanicked { worker_id });
                }
            }
        }

        debug!("All workers finished, closing results channel");
        drop(result_tx);
        outcome
    });

    let result = merge_results(result_rx);

    let report = dispatcher
        .join()
        .map_err(|_| PipelineError::DispatcherPanicked)?;
    supervisor
        .join()
        .map_err(|_| PipelineError::SupervisorPanicked)??;

    info!(
        lines_read = report.lines_read,
        dispatched = report.dispatched,
        rejected = report.rejected,
        categories = result.count.len(),
        records = result.total_records(),
        "Aggregation complete"
    );

    Ok(result)
}
