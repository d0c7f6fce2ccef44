mod collectors;
mod config;
mod error;
mod models;
mod scheduler;
mod util;

use anyhow::Result;
use clap::Parser;
use collectors::{mounts, probe::StatfsProber};
use config::{Config, Overrides, ProbeConfig};
use log::warn;
use scheduler::Verdict;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use util::human::{fmt_duration, parse_duration};
use util::report::Reporter;

#[derive(Parser, Debug)]
#[command(name = "fsping", about = "fsping: check responsiveness of mounted filesystems", version)]
struct Cli {
    /// Print every result, not just failures
    #[arg(short, long)]
    verbose: bool,

    /// Deadline for the whole run (ex: 100ms or 3s) [default: 5s]
    #[arg(short = 'T', long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Show the mount path column; --path=false hides it [default: true]
    #[arg(short, long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    path: Option<bool>,

    /// Show the device column
    #[arg(short, long)]
    dev: bool,

    /// Quiet mode: no TIMEOUT lines, only the exit status
    #[arg(short, long)]
    quiet: bool,

    /// Filesystem type to check [default: nfs]
    #[arg(short = 't', long = "type", value_name = "FSTYPE")]
    fs_type: Option<String>,

    /// Check all filesystem types
    #[arg(short, long)]
    all: bool,

    /// Print one JSON document with every result instead of text lines
    #[arg(long)]
    json: bool,

    /// Read mounts from this file instead of /proc/mounts
    #[arg(long, value_name = "FILE")]
    mounts: Option<PathBuf>,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Only check these mount points
    #[arg(value_name = "PATH")]
    paths: Vec<String>,
}

impl Cli {
    fn overrides(self) -> Overrides {
        Overrides {
            timeout:     self.timeout,
            fs_type:     self.fs_type,
            include_all: self.all,
            paths:       self.paths,
            mount_table: self.mounts,
            verbose:     self.verbose,
            quiet:       self.quiet,
            show_path:   self.path,
            show_device: self.dev,
            json:        self.json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let result = if cli.config {
        run_print_config().map(|()| Verdict::Completed)
    } else {
        run(cli)
    };

    match result {
        Ok(Verdict::Completed) => ExitCode::SUCCESS,
        Ok(Verdict::TimedOut)  => ExitCode::from(1),
        Err(e) => {
            eprintln!("fsping: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<Verdict> {
    let cfg = ProbeConfig::resolve(&Config::load(), cli.overrides());
    let candidates = mounts::list_filesystems(&cfg)?;

    let mut reporter = Reporter::new(cfg.output.clone(), io::stdout().lock());
    let run = scheduler::run_probes(candidates, cfg.timeout, Arc::new(StatfsProber), |fs| {
        if let Err(e) = reporter.completed(fs) {
            warn!("writing result for {}: {}", fs.path, e);
        }
    });

    if run.verdict == Verdict::TimedOut {
        reporter.timed_out(run.pending())?;
    }
    reporter.finish(&run, cfg.timeout)?;
    Ok(run.verdict)
}

fn run_print_config() -> Result<()> {
    let cfg = Config::load();
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  timeout_ms  = {} ({})", cfg.general.timeout_ms, fmt_duration(Duration::from_millis(cfg.general.timeout_ms)));
    println!("  fs_type     = {}", cfg.general.fs_type);
    println!("  mount_table = {}", cfg.general.mount_table.display());
    println!();
    println!("[output]");
    println!("  show_path   = {}", cfg.output.show_path);
    println!("  show_device = {}", cfg.output.show_device);
    Ok(())
}
