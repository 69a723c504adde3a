use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Worker I/O failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("Worker timed out after {0:?}")]
    Timeout(Duration),

    #[error("Worker exited with {status}: {stderr}")]
    Exited { status: ExitStatus, stderr: String },
}

impl WorkerError {
    /// Label used for the extraction outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            WorkerError::Timeout(_) => "timeout",
            _ => "failed",
        }
    }
}

/// Captured streams of a finished worker process.
#[derive(Debug)]
pub struct WorkerOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a short-lived external program, feeding it text on stdin.
#[derive(Debug, Clone)]
pub struct WorkerExecutor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl WorkerExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Spawns the program, writes `input` to its stdin, closes stdin and
    /// collects stdout/stderr until the process exits.
    ///
    /// The child is killed if the timeout elapses.
    pub async fn run(&self, input: &str) -> Result<WorkerOutput, WorkerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %self.program,
            args = ?self.args,
            input_len = input.len(),
            timeout_secs = %self.timeout.as_secs(),
            "Spawning extraction worker"
        );

        let mut child = cmd.spawn().map_err(WorkerError::Spawn)?;

        // Written from a separate task so a worker that emits output before
        // draining stdin cannot deadlock against us.
        let stdin = child.stdin.take();
        let payload = input.to_owned();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(payload.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| WorkerError::Timeout(self.timeout))?
            .map_err(WorkerError::Io)?;

        match writer.await {
            Ok(Err(e)) => tracing::debug!(error = %e, "Worker closed stdin early"),
            Err(e) => tracing::debug!(error = %e, "Worker stdin task aborted"),
            Ok(Ok(())) => {}
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(WorkerError::Exited {
                status: output.status,
                stderr,
            });
        }

        tracing::debug!(
            program = %self.program,
            output_size = stdout.len(),
            "Extraction worker finished"
        );

        Ok(WorkerOutput { stdout, stderr })
    }
}
