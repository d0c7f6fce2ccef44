use crate::error::ProbeError;
use crate::models::probe::FilesystemProbe;
use crossbeam_channel::Sender;
use std::path::Path;
use std::time::Instant;

/// The single metadata query a probe issues. Must touch the filesystem's
/// live state; may block forever on a wedged mount.
pub trait Prober: Send + Sync + 'static {
    fn statfs(&self, path: &Path) -> Result<(), ProbeError>;
}

/// statfs(2) via nix.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatfsProber;

impl Prober for StatfsProber {
    fn statfs(&self, path: &Path) -> Result<(), ProbeError> {
        nix::sys::statfs::statfs(path)?;
        Ok(())
    }
}

/// Time one query against `fs.path` and hand the finished record back on `tx`.
///
/// Always sends exactly once. If the collector has already given up the send
/// fails and the result is dropped.
pub fn probe<P: Prober + ?Sized>(prober: &P, mut fs: FilesystemProbe, tx: Sender<FilesystemProbe>) {
    let start = Instant::now();
    let result = prober.statfs(Path::new(&fs.path));
    fs.response_time = start.elapsed();
    fs.error = result.err();
    fs.done = true;
    let _ = tx.send(fs);
}
