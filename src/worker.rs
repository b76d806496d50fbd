use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::parser::MovementRecord;
use crate::stats::PartialResult;

/// Runs one pool worker until the distribution channel is closed and drained.
///
/// The worker owns its [`PartialResult`] for its whole lifetime and hands it
/// to `results` exactly once on exit. Returns the number of records it folded.
pub fn run_worker(
    worker_id: usize,
    movements: Receiver<MovementRecord>,
    results: Sender<PartialResult>,
) -> u64 {
    info!(worker_id, "Starting worker");

    let mut partial = PartialResult::new();
    let mut processed = 0u64;

    // recv() errors only once every sender is gone and the buffer is empty
    while let Ok(movement) = movements.recv() {
        partial.record(&movement);
        processed += 1;
    }

    debug!(
        worker_id,
        processed,
        categories = partial.count.len(),
        "Input exhausted, handing off partial result"
    );

    if results.send(partial).is_err() {
        warn!(worker_id, "Results channel closed before hand-off");
    }

    info!(worker_id, processed, "Finishing worker");
    processed
}
