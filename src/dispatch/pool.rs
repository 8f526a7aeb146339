use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread;

use crate::backend::{BlockingBackend, PromptRequest};
use crate::error::BenchError;

use super::mode::Concurrency;
use super::slots::ResultSlots;

/// Runs `requests` on at most `concurrency` scoped worker threads.
///
/// Workers pull the next unassigned request from a shared cursor and write
/// the output to `slots[request.index]`. With a single worker that is input
/// order. The first failure raises an abort flag; workers finish their
/// current call and stop pulling. The scope joins every worker before
/// returning.
///
/// `generate` never runs on the calling thread, so blocking clients stay out
/// of any async runtime the caller may be inside.
pub(super) fn run_pool(
    requests: &[PromptRequest],
    backend: &dyn BlockingBackend,
    concurrency: Concurrency,
    slots: &ResultSlots,
) -> Result<(), BenchError> {
    let workers = concurrency.get().min(requests.len());
    let cursor = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let failure: OnceLock<BenchError> = OnceLock::new();

    thread::scope(|scope| {
        for worker in 0..workers {
            let (cursor, abort, failure) = (&cursor, &abort, &failure);
            scope.spawn(move || {
                let mut served = 0usize;
                while !abort.load(Ordering::Acquire) {
                    let Some(request) = requests.get(cursor.fetch_add(1, Ordering::Relaxed))
                    else {
                        break;
                    };
                    let stored = backend
                        .generate(&request.text, &request.sampling_params)
                        .map_err(|source| BenchError::Backend {
                            index: request.index,
                            source,
                        })
                        .and_then(|output| slots.store(request.index, output));
                    match stored {
                        Ok(()) => served += 1,
                        Err(err) => {
                            let _ = failure.set(err);
                            abort.store(true, Ordering::Release);
                        }
                    }
                }
                log::debug!("worker {worker} served {served} requests");
            });
        }
    });

    match failure.into_inner() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
