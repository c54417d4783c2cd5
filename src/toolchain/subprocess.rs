//! Subprocess runner - executes one toolchain command and streams its output

use crate::toolchain::rusage::wait_with_peak_rss;
use crate::toolchain::{
    CommandSpec, OutputCallback, OutputStream, ToolchainConfig, ToolchainError, ToolchainOutput,
};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Runs commands under an explicit [`ToolchainConfig`]
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    config: ToolchainConfig,
}

impl SubprocessRunner {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// Run a command to completion
    ///
    /// Stdout and stderr are read concurrently; each line goes to `callback`
    /// and into the captured output in arrival order. The call returns only
    /// after the child has exited and both pipes are drained.
    ///
    /// # Errors
    /// Returns `ToolchainError` if:
    /// - The program cannot be spawned
    /// - The program exits non-zero or is killed by a signal
    pub async fn run(
        &self,
        spec: &CommandSpec,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        debug!(working_dir = ?self.config.working_dir, "spawning {}", spec);

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&self.config.working_dir)
            .envs(self.config.child_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolchainError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, tx.clone()));
        }
        drop(tx);

        let mut captured = String::new();
        while let Some((stream, line)) = rx.recv().await {
            callback.on_line(stream, &line);
            captured.push_str(&line);
            captured.push('\n');
        }

        let (status, peak_rss_kib) = wait_with_peak_rss(&mut child).await?;
        let code = status.code();
        info!(
            "{} exited with {}",
            spec,
            code.map_or_else(|| "signal".to_string(), |c| c.to_string())
        );

        if !status.success() {
            warn!("{} failed ({} bytes of output)", spec, captured.len());
            return Err(ToolchainError::Failed {
                status: code,
                output: captured,
                peak_rss_kib,
            });
        }

        Ok(ToolchainOutput {
            status: code.unwrap_or(0),
            output: captured,
            peak_rss_kib,
        })
    }
}

async fn forward_lines<R>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<(OutputStream, String)>,
) where
    R: AsyncRead + Unpin,
{
    // Lines are split on raw bytes so a stray non-UTF-8 byte never stops the
    // pipe from being drained.
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send((stream, line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("error reading {:?}: {}", stream, e);
                break;
            }
        }
    }
}
