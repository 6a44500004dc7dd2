use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};

use crate::error::RunnerError;
use crate::protocol::OutputSink;

use super::exit::normalize_exit;
use super::spawn::spawn;
use super::types::{ProcessExit, RunStatus, ScriptSpec};

const READ_CHUNK: usize = 8 * 1024;

/// Runs one answer process to completion.
///
/// `input` is written to stdin once and stdin is closed. Every stdout chunk
/// goes to `sink` in arrival order; stderr is captured verbatim. The whole
/// lifecycle is bounded by `timeout`: on expiry the child is killed and
/// [`RunStatus::TimedOut`] is returned with whatever stderr was captured.
pub async fn run_script<S: OutputSink>(
    spec: &ScriptSpec,
    input: &str,
    sink: &mut S,
    timeout: Duration,
) -> Result<RunStatus, RunnerError> {
    let started = Instant::now();
    let mut child = spawn(spec)?;
    let pid = child.id();
    tracing::debug!(pid = ?pid, cmd = %spec.display(), "answer process started");

    let stdin = child.stdin.take().ok_or(RunnerError::MissingPipe("stdin"))?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or(RunnerError::MissingPipe("stdout"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or(RunnerError::MissingPipe("stderr"))?;

    let mut stderr_buf: Vec<u8> = Vec::new();

    let lifecycle = async {
        let (_, out_res, err_res) = tokio::join!(
            write_input(stdin, input),
            pump_stdout(&mut stdout, sink),
            pump_stderr(&mut stderr, &mut stderr_buf),
        );
        out_res?;
        err_res?;
        child.wait().await.map_err(RunnerError::Wait)
    };

    let waited = tokio::time::timeout(timeout, lifecycle).await;

    match waited {
        Ok(status) => {
            let exit_code = normalize_exit(status?);
            let duration_ms = started.elapsed().as_millis() as u64;
            tracing::debug!(pid = ?pid, exit_code, duration_ms, "answer process exited");
            Ok(RunStatus::Exited(ProcessExit {
                exit_code,
                stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                duration_ms,
            }))
        }
        Err(_) => {
            tracing::warn!(pid = ?pid, timeout_secs = timeout.as_secs(), "answer process timed out, killing");
            kill_and_reap(&mut child).await;
            Ok(RunStatus::TimedOut {
                after: timeout,
                stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
            })
        }
    }
}

async fn write_input(mut stdin: ChildStdin, input: &str) {
    // A script that exits without reading stdin closes the pipe early; the
    // exit status decides the outcome, not the write.
    if let Err(e) = stdin.write_all(input.as_bytes()).await {
        tracing::warn!(error = %e, "failed to write query to answer process stdin");
        return;
    }
    if let Err(e) = stdin.shutdown().await {
        tracing::warn!(error = %e, "failed to close answer process stdin");
    }
}

async fn pump_stdout<R, S>(reader: &mut R, sink: &mut S) -> Result<(), RunnerError>
where
    R: AsyncRead + Unpin,
    S: OutputSink,
{
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|source| RunnerError::StreamIo {
                stream: "stdout",
                source,
            })?;
        if n == 0 {
            return Ok(());
        }
        sink.on_stdout(&chunk[..n]);
    }
}

async fn pump_stderr<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<(), RunnerError>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|source| RunnerError::StreamIo {
                stream: "stderr",
                source,
            })?;
        if n == 0 {
            return Ok(());
        }
        tracing::warn!(stderr = %String::from_utf8_lossy(&chunk[..n]).trim_end(), "answer process stderr");
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::warn!(error = %e, "failed to kill answer process");
        return;
    }
    if let Err(e) = child.wait().await {
        tracing::warn!(error = %e, "failed to reap killed answer process");
    }
}
