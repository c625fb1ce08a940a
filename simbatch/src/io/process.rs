//! Helpers for running child processes with bounded output and an optional timeout.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// How long output readers may keep draining after a timed-out child is killed.
///
/// Grandchildren survive `kill` and can hold the pipes open indefinitely.
pub const KILL_GRACE: Duration = Duration::from_millis(250);

/// Captured child process output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }

    pub fn stdout_lossy(&self) -> String {
        with_notice(&self.stdout, self.stdout_truncated, "stdout")
    }

    pub fn stderr_lossy(&self) -> String {
        with_notice(&self.stderr, self.stderr_truncated, "stderr")
    }
}

fn with_notice(bytes: &[u8], truncated: usize, label: &str) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if truncated > 0 {
        text.push_str(&format!("\n[{label} truncated {truncated} bytes]\n"));
    }
    text
}

/// Run a command to completion and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
/// With `timeout = None` the call blocks until the child exits. After a timeout the child is
/// killed and output collected within [`KILL_GRACE`]; readers still blocked on pipes held by
/// surviving descendants are detached and their partial output returned.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs()), output_limit_bytes))]
pub fn run_command(
    mut cmd: Command,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_capture = Capture::spawn(stdout, output_limit_bytes);
    let stderr_capture = Capture::spawn(stderr, output_limit_bytes);

    let mut timed_out = false;
    let status: ExitStatus = match timeout {
        None => child.wait().context("wait for command")?,
        Some(timeout) => match child.wait_timeout(timeout).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "command timed out, killing"
                );
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
    };

    let deadline = timed_out.then(|| Instant::now() + KILL_GRACE);
    let (stdout, stdout_truncated) = stdout_capture.finish(deadline).context("collect stdout")?;
    let (stderr, stderr_truncated) = stderr_capture.finish(deadline).context("collect stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        exit_code: status.code(),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: usize,
}

/// A pipe drained on a background thread into a shared buffer.
struct Capture {
    buffer: Arc<Mutex<Captured>>,
    done: mpsc::Receiver<Result<()>>,
}

impl Capture {
    fn spawn<R: Read + Send + 'static>(reader: R, limit: usize) -> Self {
        let buffer = Arc::new(Mutex::new(Captured::default()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buffer);
        thread::spawn(move || {
            // The receiver may have given up already.
            let _ = tx.send(read_stream_limited(reader, limit, &sink));
        });
        Self { buffer, done }
    }

    /// Wait for the reader to hit EOF, or until `deadline` if given.
    fn finish(self, deadline: Option<Instant>) -> Result<(Vec<u8>, usize)> {
        let finished = match deadline {
            None => Some(
                self.done
                    .recv()
                    .map_err(|_| anyhow!("output reader thread panicked"))?,
            ),
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match self.done.recv_timeout(wait) {
                    Ok(result) => Some(result),
                    Err(RecvTimeoutError::Timeout) => {
                        warn!("output pipe still open after kill, detaching reader");
                        None
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(anyhow!("output reader thread panicked"));
                    }
                }
            }
        };
        if let Some(result) = finished {
            result?;
        }
        let mut captured = self
            .buffer
            .lock()
            .map_err(|_| anyhow!("output buffer poisoned"))?;
        Ok((std::mem::take(&mut captured.bytes), captured.truncated))
    }
}

fn read_stream_limited<R: Read>(
    mut reader: R,
    limit: usize,
    sink: &Mutex<Captured>,
) -> Result<()> {
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let mut captured = sink
            .lock()
            .map_err(|_| anyhow!("output buffer poisoned"))?;
        let remaining = limit.saturating_sub(captured.bytes.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            captured.bytes.extend_from_slice(&chunk[..keep]);
            captured.truncated += n.saturating_sub(keep);
        } else {
            captured.truncated += n;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_stream_limited_counts_dropped_bytes() {
        let input: &[u8] = b"0123456789";
        let sink = Mutex::new(Captured::default());
        read_stream_limited(input, 4, &sink).expect("read");
        let captured = sink.into_inner().expect("lock");
        assert_eq!(captured.bytes, b"0123");
        assert_eq!(captured.truncated, 6);
    }

    #[test]
    fn lossy_output_appends_truncation_notice() {
        let output = CommandOutput {
            stdout: b"abc".to_vec(),
            stdout_truncated: 7,
            ..CommandOutput::default()
        };
        assert_eq!(output.stdout_lossy(), "abc\n[stdout truncated 7 bytes]\n");
        assert_eq!(output.stderr_lossy(), "");
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let cmd = Command::new("/definitely/not/a/real/binary");
        let err = run_command(cmd, None, 1024).expect_err("spawn should fail");
        assert!(format!("{err:#}").contains("spawn command"));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_nonzero_exit() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run_command(cmd, None, 1024).expect("run");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout_lossy(), "out\n");
        assert_eq!(output.stderr_lossy(), "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_returns_promptly_despite_surviving_grandchild() {
        // `sleep` outlives the killed shell and keeps stdout/stderr open.
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo started; sleep 5; echo finished"]);
        let start = Instant::now();
        let output = run_command(cmd, Some(Duration::from_millis(100)), 1024).expect("run");
        let elapsed = start.elapsed();

        assert!(output.timed_out);
        assert!(!output.success());
        assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
        assert_eq!(output.stdout_lossy(), "started\n");
    }
}
