//! Test helpers and utilities

use std::io;
use std::path::Path;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use script_exporter::executor::ProcessOutput;
use script_exporter::logging::JsonFormatter;
use script_exporter::{LabelSet, ProcessRunner, PrometheusSink, SchedulerConfig};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;

/// One canned script run.
#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum Step {
    /// Exit 0 with this stdout.
    Stdout(&'static str),
    /// Exit 1 with this stderr and no stdout.
    Stderr(&'static str),
    /// The process could not be launched.
    LaunchError,
}

/// Fake runner replaying steps in order; the last step repeats.
pub struct ScriptedRunner {
    steps: Mutex<Vec<Step>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedRunner {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        assert!(!steps.is_empty(), "at least one step required");
        Arc::new(Self {
            steps: Mutex::new(steps),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of script runs so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, _path: &Path) -> ProcessOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.remove(0)
            } else {
                steps[0].clone()
            }
        };

        match step {
            Step::Stdout(out) => ProcessOutput {
                stdout: out.to_string(),
                stderr: String::new(),
                status: Ok(exit_status(0)),
            },
            Step::Stderr(err) => ProcessOutput {
                stdout: String::new(),
                stderr: err.to_string(),
                status: Ok(exit_status(1)),
            },
            Step::LaunchError => ProcessOutput {
                stdout: String::new(),
                stderr: String::new(),
                status: Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            },
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// Scheduler timing tuned for fast tests.
pub fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        poll_quantum: Duration::from_millis(20),
        safety_bound: Some(Duration::from_secs(10)),
    }
}

/// Build a label-set from pairs.
pub fn labels(pairs: &[(&str, &str)]) -> LabelSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Prometheus text output of the sink.
pub fn exported(sink: &PrometheusSink) -> String {
    sink.export().expect("export failed")
}

/// Exported sample lines (no HELP/TYPE comments) for one metric, sorted.
#[allow(dead_code)]
pub fn samples(sink: &PrometheusSink, metric: &str) -> Vec<String> {
    let mut lines: Vec<String> = exported(sink)
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(metric)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

/// Poll `cond` every 10ms until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// JSON log lines emitted on the current thread while this value lives.
#[allow(dead_code)]
pub struct LogCapture {
    buffer: Buffer,
    _guard: DefaultGuard,
}

#[allow(dead_code)]
impl LogCapture {
    pub fn start() -> Self {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(JsonFormatter::new("script_exporter_test"))
                .with_writer(move || writer.clone()),
        );
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            buffer,
            _guard: guard,
        }
    }

    /// Every captured line, parsed.
    pub fn lines(&self) -> Vec<serde_json::Value> {
        let raw = String::from_utf8(self.buffer.0.lock().unwrap().clone()).unwrap();
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("log line is not JSON"))
            .collect()
    }

    /// Warn-level lines whose message is `msg`.
    pub fn warnings(&self, msg: &str) -> Vec<serde_json::Value> {
        self.lines()
            .into_iter()
            .filter(|line| line["level"] == "warn" && line["msg"] == msg)
            .collect()
    }
}
