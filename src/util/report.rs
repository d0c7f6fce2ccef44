use crate::config::OutputOptions;
use crate::models::probe::{FilesystemProbe, ProbeStatus};
use crate::scheduler::ProbeRun;
use crate::util::human::fmt_duration;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::time::Duration;

/// Render one result line: status, then the optional path / device columns,
/// then the error text if there is one.
pub fn render_line(fs: &FilesystemProbe, opts: &OutputOptions) -> String {
    let status = match fs.status() {
        ProbeStatus::Stale        => "STALE".to_string(),
        ProbeStatus::Error        => "ERROR".to_string(),
        ProbeStatus::Timeout      => "TIMEOUT".to_string(),
        ProbeStatus::Responded(d) => fmt_duration(d),
    };
    let mut s = format!("{:<9}", status);
    if opts.show_path {
        s.push_str(&format!(" {:<20}", fs.path));
    }
    if opts.show_device {
        s.push_str(&format!(" {:<30}", fs.device));
    }
    if let Some(e) = &fs.error {
        s.push_str(&format!(" {}", e));
    }
    s
}

/// Writes result lines as a run progresses, or one JSON document at the end.
pub struct Reporter<W: Write> {
    opts: OutputOptions,
    out:  W,
}

impl<W: Write> Reporter<W> {
    pub fn new(opts: OutputOptions, out: W) -> Self {
        Self { opts, out }
    }

    /// A probe reported before the deadline. Printed when verbose or failed.
    pub fn completed(&mut self, fs: &FilesystemProbe) -> io::Result<()> {
        if self.opts.json || !(self.opts.verbose || fs.is_failed()) {
            return Ok(());
        }
        writeln!(self.out, "{}", render_line(fs, &self.opts))
    }

    /// The deadline passed; one TIMEOUT line per probe that never reported.
    pub fn timed_out<'a, I>(&mut self, pending: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a FilesystemProbe>,
    {
        if self.opts.json || self.opts.quiet {
            return Ok(());
        }
        for fs in pending {
            writeln!(self.out, "{}", render_line(fs, &self.opts))?;
        }
        Ok(())
    }

    /// End of run: emit the JSON document when asked for, flush either way.
    pub fn finish(&mut self, run: &ProbeRun, timeout: Duration) -> io::Result<()> {
        if self.opts.json {
            let doc = json_document(run, timeout);
            writeln!(self.out, "{}", serde_json::to_string_pretty(&doc)?)?;
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

pub fn json_document(run: &ProbeRun, timeout: Duration) -> Value {
    let filesystems: Vec<Value> = run.probes.values().map(|fs| {
        let status = fs.status();
        let response_time_ms = match status {
            ProbeStatus::Responded(d) => Some(d.as_nanos() as f64 / 1_000_000.0),
            _                         => None,
        };
        json!({
            "path":             fs.path,
            "device":           fs.device,
            "fstype":           fs.fs_type,
            "status":           status.label(),
            "response_time_ms": response_time_ms,
            "error":            fs.error.as_ref().map(|e| e.to_string()),
        })
    }).collect();

    json!({
        "fsping_version": env!("CARGO_PKG_VERSION"),
        "timestamp":      chrono::Local::now().to_rfc3339(),
        "timeout_ms":     timeout.as_millis() as u64,
        "verdict":        run.verdict.label(),
        "filesystems":    filesystems,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::mounts::Candidates;
    use crate::error::ProbeError;
    use crate::scheduler::Verdict;
    use nix::errno::Errno;

    fn answered(path: &str, ms: u64) -> FilesystemProbe {
        let mut fs = FilesystemProbe::new(path, "filer:/export", "nfs");
        fs.done = true;
        fs.response_time = Duration::from_millis(ms);
        fs
    }

    fn failed(path: &str, e: Errno) -> FilesystemProbe {
        let mut fs = answered(path, 1);
        fs.error = Some(ProbeError::Os(e));
        fs
    }

    fn reporter(opts: OutputOptions) -> Reporter<Vec<u8>> {
        Reporter::new(opts, Vec::new())
    }

    fn text(r: Reporter<Vec<u8>>) -> String {
        String::from_utf8(r.into_inner()).unwrap()
    }

    #[test]
    fn line_columns() {
        let opts = OutputOptions::default();
        let line = render_line(&answered("/mnt/a", 10), &opts);
        assert_eq!(line, format!("{:<9} {:<20}", "10ms", "/mnt/a"));
        assert_eq!(line.split_whitespace().collect::<Vec<_>>(), vec!["10ms", "/mnt/a"]);

        let opts = OutputOptions { show_path: false, show_device: true, ..OutputOptions::default() };
        let line = render_line(&answered("/mnt/a", 10), &opts);
        assert_eq!(line, format!("{:<9} {:<30}", "10ms", "filer:/export"));
    }

    #[test]
    fn line_status_for_failures() {
        let opts = OutputOptions::default();
        let stale = render_line(&failed("/mnt/a", Errno::ESTALE), &opts);
        assert!(stale.starts_with("STALE    "));
        assert!(stale.ends_with(&Errno::ESTALE.to_string()));

        let err = render_line(&failed("/mnt/a", Errno::EACCES), &opts);
        assert!(err.starts_with("ERROR    "));

        let timeout = render_line(&FilesystemProbe::new("/mnt/a", "d", "nfs"), &opts);
        assert_eq!(timeout.split_whitespace().collect::<Vec<_>>(), vec!["TIMEOUT", "/mnt/a"]);
    }

    #[test]
    fn successes_only_shown_when_verbose() {
        let mut r = reporter(OutputOptions::default());
        r.completed(&answered("/mnt/a", 10)).unwrap();
        r.completed(&failed("/mnt/b", Errno::EIO)).unwrap();
        let out = text(r);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("ERROR"));

        let mut r = reporter(OutputOptions { verbose: true, ..OutputOptions::default() });
        r.completed(&answered("/mnt/a", 10)).unwrap();
        assert!(text(r).starts_with("10ms"));
    }

    #[test]
    fn quiet_hides_only_timeouts() {
        let mut r = reporter(OutputOptions { quiet: true, ..OutputOptions::default() });
        r.completed(&failed("/mnt/b", Errno::ESTALE)).unwrap();
        r.timed_out([&FilesystemProbe::new("/mnt/a", "d", "nfs")]).unwrap();
        let out = text(r);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("STALE"));
    }

    #[test]
    fn json_mode_prints_one_document() {
        let mut probes = Candidates::new();
        probes.insert("/mnt/a".into(), answered("/mnt/a", 10));
        probes.insert("/mnt/b".into(), failed("/mnt/b", Errno::ESTALE));
        probes.insert("/mnt/c".into(), FilesystemProbe::new("/mnt/c", "d", "nfs"));
        let run = ProbeRun { verdict: Verdict::TimedOut, probes };

        let mut r = reporter(OutputOptions { json: true, verbose: true, ..OutputOptions::default() });
        for fs in run.probes.values().filter(|fs| fs.done) {
            r.completed(fs).unwrap();
        }
        r.timed_out(run.pending()).unwrap();
        r.finish(&run, Duration::from_secs(5)).unwrap();

        let doc: Value = serde_json::from_str(&text(r)).unwrap();
        assert_eq!(doc["verdict"], "timed_out");
        assert_eq!(doc["timeout_ms"], 5000);
        let fss = doc["filesystems"].as_array().unwrap();
        assert_eq!(fss.len(), 3);
        assert_eq!(fss[0]["status"], "ok");
        assert_eq!(fss[0]["response_time_ms"], 10.0);
        assert_eq!(fss[1]["status"], "stale");
        assert!(fss[1]["response_time_ms"].is_null());
        assert_eq!(fss[2]["status"], "timeout");
        assert!(fss[2]["error"].is_null());
    }
}
