use nix::errno::Errno;
use thiserror::Error;

/// Failure of a single metadata query against one mount point.
///
/// Only ever stored in that filesystem's own record; it never aborts a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The statfs syscall came back with an errno (ESTALE, EACCES, EIO, ...)
    #[error("{0}")]
    Os(#[from] Errno),

    /// Anything that isn't a plain errno, e.g. the probe thread could not start
    #[error("{0}")]
    Other(String),
}

/// Rejected `--timeout` / `timeout` value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration '{0}'")]
    Invalid(String),

    #[error("missing unit in duration '{0}' (ex: 100ms or 3s)")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { input: String, unit: String },

    #[error("negative duration '{0}'")]
    Negative(String),
}
