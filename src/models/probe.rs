use crate::error::ProbeError;
use std::time::Duration;

/// One mounted filesystem under consideration during a probing run.
#[derive(Debug, Clone)]
pub struct FilesystemProbe {
    pub path:          String,   // "/mnt/nfs"
    pub device:        String,   // "server:/export"
    pub fs_type:       String,   // "nfs4"
    pub response_time: Duration, // only meaningful when done && error.is_none()
    pub done:          bool,
    pub error:         Option<ProbeError>,
}

/// What a probe's error text says about the mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Stale,
    Other,
}

/// Final status of one filesystem, the thing the status column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Responded(Duration),
    Stale,
    Error,
    Timeout,
}

impl ProbeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeStatus::Responded(_) => "ok",
            ProbeStatus::Stale        => "stale",
            ProbeStatus::Error        => "error",
            ProbeStatus::Timeout      => "timeout",
        }
    }
}

/// Map a probe error onto `Stale` / `Other` by looking for "stale" in its text.
///
/// Case is ignored: nix prints ESTALE as "Stale file handle", while Go's
/// errno table spelled it "stale NFS file handle", so a lowercase match is
/// what actually caught stale mounts there.
pub fn classify(err: &ProbeError) -> ErrorKind {
    if err.to_string().to_lowercase().contains("stale") {
        ErrorKind::Stale
    } else {
        ErrorKind::Other
    }
}

impl FilesystemProbe {
    pub fn new(path: impl Into<String>, device: impl Into<String>, fs_type: impl Into<String>) -> Self {
        Self {
            path:          path.into(),
            device:        device.into(),
            fs_type:       fs_type.into(),
            response_time: Duration::ZERO,
            done:          false,
            error:         None,
        }
    }

    /// An error wins over everything else, then a missing completion.
    pub fn status(&self) -> ProbeStatus {
        match (&self.error, self.done) {
            (Some(e), _) => match classify(e) {
                ErrorKind::Stale => ProbeStatus::Stale,
                ErrorKind::Other => ProbeStatus::Error,
            },
            (None, false) => ProbeStatus::Timeout,
            (None, true)  => ProbeStatus::Responded(self.response_time),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
