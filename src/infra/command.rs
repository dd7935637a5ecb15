//! # Command Execution Module
//!
//! Spawns the BDD engine and captures its combined output.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::infra::t;

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// If the returned future is dropped before completion and the command was
/// built with `kill_on_drop(true)`, the child is killed. The executor relies
/// on this to enforce module timeouts.
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<ExitStatus>, String) {
    let mut child = match cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn() {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let Some(stdout) = child.stdout.take() else {
        return (
            Err(std::io::Error::other(t!("command.capture_stdout_failed").to_string())),
            String::new(),
        );
    };
    let Some(stderr) = child.stderr.take() else {
        return (
            Err(std::io::Error::other(t!("command.capture_stderr_failed").to_string())),
            String::new(),
        );
    };

    let output = Arc::new(tokio::sync::Mutex::new(String::new()));
    let stdout_handle = tokio::spawn(collect_lines(stdout, Arc::clone(&output)));
    let stderr_handle = tokio::spawn(collect_lines(stderr, Arc::clone(&output)));

    let status = child.wait().await;

    // Wait for both readers so no trailing output is lost.
    if let Err(e) = stdout_handle.await {
        eprintln!("{}", t!("command.join_reader_failed", stream = "stdout", error = e));
    }
    if let Err(e) = stderr_handle.await {
        eprintln!("{}", t!("command.join_reader_failed", stream = "stderr", error = e));
    }

    let output = output.lock().await.clone();
    (status, output)
}

async fn collect_lines<R>(stream: R, sink: Arc<tokio::sync::Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut output = sink.lock().await;
        output.push_str(&line);
        output.push('\n');
    }
}
