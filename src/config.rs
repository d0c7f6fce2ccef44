use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persistent defaults, read from `~/.config/fsping/fsping.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Global deadline for a probing run, in milliseconds
    pub timeout_ms: u64,
    /// Filesystem type probed when --type / --all are not given
    pub fs_type: String,
    /// Mount table to read candidates from
    pub mount_table: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub show_path:   bool,
    pub show_device: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_ms:  5000,
            fs_type:     "nfs".into(),
            mount_table: PathBuf::from("/proc/mounts"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { show_path: true, show_device: false }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    /// Load the config file, falling back to defaults.
    ///
    /// A missing file is created with the defaults (best-effort); a file
    /// that fails to parse is left alone and only reported.
    pub fn load() -> Self {
        let Some(path) = Config::config_path() else {
            debug!("no config dir, using defaults");
            return Config::default();
        };
        if !path.exists() {
            if let Err(e) = try_write_defaults(&path) {
                debug!("could not write default config {}: {:#}", path.display(), e);
            }
            return Config::default();
        }
        match Config::load_from(&path) {
            Ok(c)  => c,
            Err(e) => {
                warn!("ignoring config: {:#}", e);
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: Config = toml::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fsping").join("fsping.toml"))
    }
}

fn try_write_defaults(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# fsping configuration\n# Command-line flags override these values\n\n{}", text))?;
    Ok(())
}

// ── Effective run configuration ──────────────────────────────────────

/// Which result lines are printed and which columns they carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub verbose:     bool,
    pub quiet:       bool,
    pub show_path:   bool,
    pub show_device: bool,
    pub json:        bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { verbose: false, quiet: false, show_path: true, show_device: false, json: false }
    }
}

/// Everything one probing run needs, fixed before the first probe starts.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout:     Duration,
    pub fs_type:     String,
    pub include_all: bool,
    /// Explicit allow-list of mount points; empty means "every match"
    pub paths:       Vec<String>,
    pub mount_table: PathBuf,
    pub output:      OutputOptions,
}

/// Command-line values that may override the config file; `None` = not given.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub timeout:     Option<Duration>,
    pub fs_type:     Option<String>,
    pub include_all: bool,
    pub paths:       Vec<String>,
    pub mount_table: Option<PathBuf>,
    pub verbose:     bool,
    pub quiet:       bool,
    pub show_path:   Option<bool>,
    pub show_device: bool,
    pub json:        bool,
}

impl ProbeConfig {
    pub fn resolve(cfg: &Config, ov: Overrides) -> Self {
        Self {
            timeout:     ov.timeout.unwrap_or(Duration::from_millis(cfg.general.timeout_ms)),
            fs_type:     ov.fs_type.unwrap_or_else(|| cfg.general.fs_type.clone()),
            include_all: ov.include_all,
            paths:       ov.paths,
            mount_table: ov.mount_table.unwrap_or_else(|| cfg.general.mount_table.clone()),
            output: OutputOptions {
                verbose:     ov.verbose,
                quiet:       ov.quiet,
                show_path:   ov.show_path.unwrap_or(cfg.output.show_path),
                show_device: ov.show_device || cfg.output.show_device,
                json:        ov.json,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_command_line_defaults() {
        let pc = ProbeConfig::resolve(&Config::default(), Overrides::default());
        assert_eq!(pc.timeout, Duration::from_secs(5));
        assert_eq!(pc.fs_type, "nfs");
        assert_eq!(pc.mount_table, PathBuf::from("/proc/mounts"));
        assert!(!pc.include_all);
        assert!(pc.paths.is_empty());
        assert_eq!(pc.output, OutputOptions::default());
    }

    #[test]
    fn command_line_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.general.timeout_ms = 250;
        cfg.general.fs_type = "cifs".into();
        cfg.output.show_path = false;

        let pc = ProbeConfig::resolve(&cfg, Overrides::default());
        assert_eq!(pc.timeout, Duration::from_millis(250));
        assert_eq!(pc.fs_type, "cifs");
        assert!(!pc.output.show_path);

        let pc = ProbeConfig::resolve(&cfg, Overrides {
            timeout:   Some(Duration::from_secs(2)),
            fs_type:   Some("nfs4".into()),
            show_path: Some(true),
            ..Overrides::default()
        });
        assert_eq!(pc.timeout, Duration::from_secs(2));
        assert_eq!(pc.fs_type, "nfs4");
        assert!(pc.output.show_path);
    }

    #[test]
    fn partial_config_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fsping.toml");
        fs::write(&path, "[general]\ntimeout_ms = 1500\n\n[output]\nshow_device = true\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.general.timeout_ms, 1500);
        assert_eq!(cfg.general.fs_type, "nfs");
        assert!(cfg.output.show_path);
        assert!(cfg.output.show_device);
    }

    #[test]
    fn broken_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fsping.toml");
        fs::write(&path, "[general\ntimeout_ms = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn default_config_round_trips_through_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fsping.toml");
        try_write_defaults(&path).unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.general.timeout_ms, 5000);
        assert_eq!(cfg.general.mount_table, PathBuf::from("/proc/mounts"));
    }
}
