use crate::config::ProbeConfig;
use crate::models::probe::FilesystemProbe;
use anyhow::{Context, Result};
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device:  String,
    pub mount:   String,
    pub fs_type: String,
}

/// Candidate set for a run, keyed (and iterated) by mount point.
pub type Candidates = BTreeMap<String, FilesystemProbe>;

/// Read the configured mount table and select the filesystems to probe.
///
/// An unreadable mount table is the one fatal startup error.
pub fn list_filesystems(cfg: &ProbeConfig) -> Result<Candidates> {
    let entries = read_mount_table(&cfg.mount_table)?;
    let candidates = select(&entries, &cfg.fs_type, cfg.include_all, &cfg.paths);
    debug!(
        "{}: {} mount(s), {} candidate(s) (type={}, all={}, paths={})",
        cfg.mount_table.display(), entries.len(), candidates.len(),
        cfg.fs_type, cfg.include_all, cfg.paths.len(),
    );
    Ok(candidates)
}

pub fn read_mount_table(path: &Path) -> Result<Vec<MountEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading mount table {}", path.display()))?;
    Ok(parse_mount_table(&content))
}

/// "device mountpoint fstype options dump pass", one mount per line.
pub fn parse_mount_table(content: &str) -> Vec<MountEntry> {
    let mut v = Vec::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 { continue; }
        v.push(MountEntry {
            device:  unescape(fields[0]),
            mount:   unescape(fields[1]),
            fs_type: fields[2].to_string(),
        });
    }
    v
}

/// Keep entries of `fs_type` (or all of them), then restrict to `paths` if any
/// were requested. A mount point listed twice keeps its last entry.
pub fn select(entries: &[MountEntry], fs_type: &str, include_all: bool, paths: &[String]) -> Candidates {
    let mut out = Candidates::new();
    for e in entries {
        if !include_all && e.fs_type != fs_type { continue; }
        out.insert(e.mount.clone(), FilesystemProbe::new(&e.mount, &e.device, &e.fs_type));
    }
    if !paths.is_empty() {
        out.retain(|mount, _| paths.iter().any(|p| p == mount));
    }
    out
}

/// Undo the kernel's octal escaping of whitespace and backslashes ("\040" → ' ').
fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
            let b = (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
            out.push(b);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3
        && (b'0'..=b'3').contains(&digits[0])
        && digits[1..].iter().all(|d| (b'0'..=b'7').contains(d))
}
