use futures::future::join_all;

use crate::backend::{AsyncBackend, PromptRequest};
use crate::error::BenchError;

use super::mode::Concurrency;
use super::slots::ResultSlots;

/// Issues `requests` in contiguous batches of `concurrency`.
///
/// Every call of a batch is awaited before its outputs are written and the
/// next batch starts. A failure anywhere in a batch aborts the run once that
/// batch has settled; the lowest failing position is reported.
pub(super) async fn run_batches(
    requests: &[PromptRequest],
    backend: &dyn AsyncBackend,
    concurrency: Concurrency,
    slots: &ResultSlots,
) -> Result<(), BenchError> {
    for (batch_no, batch) in requests.chunks(concurrency.get()).enumerate() {
        let calls = batch.iter().map(|request| async move {
            let result = backend
                .generate(&request.text, &request.sampling_params)
                .await;
            (request.index, result)
        });
        let settled = join_all(calls).await;
        log::debug!("batch {batch_no} settled ({} requests)", settled.len());

        for (index, result) in settled {
            let output = result.map_err(|source| BenchError::Backend { index, source })?;
            slots.store(index, output)?;
        }
    }
    Ok(())
}
