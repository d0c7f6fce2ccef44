//! Probe scheduler / collector.
//!
//! One thread per candidate, one completion channel, one deadline for the
//! whole run. Probes still blocked when the deadline passes are abandoned:
//! their threads keep running until the process exits and whatever they
//! send afterwards is never read.

use crate::collectors::mounts::Candidates;
use crate::collectors::probe::{probe, Prober};
use crate::error::ProbeError;
use crate::models::probe::FilesystemProbe;
use crossbeam_channel::{at, select, unbounded};
use log::{debug, warn};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every probe reported (successfully or not) before the deadline
    Completed,
    /// The deadline passed with at least one probe outstanding
    TimedOut,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Completed => "completed",
            Verdict::TimedOut  => "timed_out",
        }
    }
}

/// Final state of a run: every candidate, `done` or not.
#[derive(Debug)]
pub struct ProbeRun {
    pub verdict: Verdict,
    pub probes:  Candidates,
}

impl ProbeRun {
    /// Candidates that never reported.
    pub fn pending(&self) -> impl Iterator<Item = &FilesystemProbe> {
        self.probes.values().filter(|fs| !fs.done)
    }
}

/// Probe every candidate concurrently and collect results until all have
/// reported or `timeout` has elapsed, whichever comes first.
///
/// `on_complete` sees each completion in arrival order, as it arrives.
pub fn run_probes<F>(
    mut candidates: Candidates,
    timeout:        Duration,
    prober:         Arc<dyn Prober>,
    mut on_complete: F,
) -> ProbeRun
where
    F: FnMut(&FilesystemProbe),
{
    let mut outstanding = candidates.len();
    if outstanding == 0 {
        return ProbeRun { verdict: Verdict::Completed, probes: candidates };
    }

    let (tx, rx) = unbounded::<FilesystemProbe>();
    for fs in candidates.values() {
        let unit    = fs.clone();
        let unit_tx = tx.clone();
        let prober  = Arc::clone(&prober);
        debug!("probing {} ({})", fs.path, fs.device);
        let spawned = thread::Builder::new()
            .name(format!("probe {}", fs.path))
            .spawn(move || probe(prober.as_ref(), unit, unit_tx));
        if let Err(e) = spawned {
            // the closure (and its sender) is gone; report on its behalf
            warn!("could not start probe for {}: {}", fs.path, e);
            let _ = tx.send(not_started(fs, &e));
        }
    }
    drop(tx);

    let deadline_at = Instant::now() + timeout;
    let deadline = at(deadline_at);
    while outstanding > 0 {
        if Instant::now() >= deadline_at {
            break;
        }
        select! {
            recv(rx) -> msg => match msg {
                Ok(fs) => {
                    debug!("{} answered in {:?} (error: {:?})", fs.path, fs.response_time, fs.error);
                    on_complete(&fs);
                    if let Some(slot) = candidates.get_mut(&fs.path) {
                        if !slot.done {
                            *slot = fs;
                            outstanding -= 1;
                        }
                    }
                }
                Err(_) => {
                    // every probe thread is gone without reporting; nothing more can arrive
                    warn!("all probe threads exited with {} result(s) missing", outstanding);
                    break;
                }
            },
            recv(deadline) -> _ => break,
        }
    }

    if outstanding > 0 {
        debug!("deadline of {:?} passed with {} probe(s) outstanding", timeout, outstanding);
        ProbeRun { verdict: Verdict::TimedOut, probes: candidates }
    } else {
        ProbeRun { verdict: Verdict::Completed, probes: candidates }
    }
}

/// The record reported for a candidate whose probe thread never started.
fn not_started(fs: &FilesystemProbe, err: &io::Error) -> FilesystemProbe {
    let mut failed = fs.clone();
    failed.done = true;
    failed.error = Some(ProbeError::Other(format!("probe not started: {}", err)));
    failed
}
