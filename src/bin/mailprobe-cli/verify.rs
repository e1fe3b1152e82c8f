use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{Result, anyhow};
use mailprobe_lib::{HostResolver, VerificationResult, Verifier};
use tracing::debug;

/// Verifies every address with at most `jobs` probes in flight. Results come
/// back in input order.
pub fn verify_all<R>(
    verifier: &Verifier<R>,
    emails: &[String],
    jobs: usize,
) -> Result<Vec<VerificationResult>>
where
    R: HostResolver + Sync,
{
    let workers = jobs.clamp(1, emails.len().max(1));
    debug!(count = emails.len(), workers, "starting batch");

    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(email) = emails.get(index) else {
                        break;
                    };
                    if tx.send((index, verifier.verify(email))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<VerificationResult>> = vec![None; emails.len()];
    for (index, result) in rx {
        slots[index] = Some(result);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| anyhow!("worker lost result for line {}", index + 1))
        })
        .collect()
}
