//! Engine process supervision.
//!
//! Spawns the external proxy engine against a generated config file,
//! relays its stdout/stderr line-by-line to a caller-supplied sink, and
//! exposes a forceful stop. No retry and no restart-on-crash: the
//! engine exiting, for any reason, simply ends the supervision.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{EngineError, Result};

/// Identity of a relayed output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStream::Stdout => write!(f, "stdout"),
            LogStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Callback receiving relayed engine output lines.
///
/// Invoked concurrently from both relay tasks; the `Send + Sync` bound
/// makes the caller responsible for synchronizing whatever the closure
/// writes into.
pub type LogSink = Arc<dyn Fn(LogStream, String) + Send + Sync>;

/// Handle to a launched engine process.
///
/// Dropping the handle does not stop the engine; use
/// [`EngineSupervisor::stop`] for that.
#[derive(Debug)]
pub struct EngineHandle {
    task: JoinHandle<Result<ExitStatus>>,
}

impl EngineHandle {
    /// Waits for the engine to exit and returns its status.
    ///
    /// Callers typically await this inside a spawned task so their own
    /// flow stays responsive.
    pub async fn wait(self) -> Result<ExitStatus> {
        self.task.await.map_err(|_| EngineError::TaskJoin)?
    }
}

/// Supervises at most one engine process at a time.
///
/// Starting a second engine while one is running is not guarded here;
/// it replaces the tracked kill handle and the caller is expected to
/// stop the previous instance first.
pub struct EngineSupervisor {
    binary: PathBuf,
    kill_slot: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl EngineSupervisor {
    /// Creates a supervisor for the engine binary at `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            kill_slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Path of the engine binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Whether a launched engine has not yet exited or been stopped.
    pub fn is_running(&self) -> bool {
        self.kill_slot.lock().is_some()
    }

    /// Spawns `<binary> -config <config_path>` and begins relaying its
    /// output to `sink`.
    ///
    /// Fails with [`EngineError::Spawn`] when the binary is missing or
    /// not executable. The returned handle resolves when the engine
    /// exits, whether on its own or via [`stop`](Self::stop).
    pub fn start(&self, config_path: &Path, sink: LogSink) -> Result<EngineHandle> {
        let mut child = Command::new(&self.binary)
            .arg("-config")
            .arg(config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::Spawn)?;

        tracing::info!(
            "Started engine {} with config {}",
            self.binary.display(),
            config_path.display()
        );

        let stdout = child.stdout.take().ok_or(EngineError::Pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(EngineError::Pipe("stderr"))?;

        tokio::spawn(relay(LogStream::Stdout, stdout, Arc::clone(&sink)));
        tokio::spawn(relay(LogStream::Stderr, stderr, sink));

        let (kill_tx, mut kill_rx) = oneshot::channel();
        *self.kill_slot.lock() = Some(kill_tx);

        let slot = Arc::clone(&self.kill_slot);
        let task = tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status.map_err(EngineError::Wait),
                request = &mut kill_rx => {
                    // Err means the sender was dropped without an
                    // explicit stop; keep waiting for a natural exit.
                    if request.is_ok() {
                        let _ = child.kill().await;
                    }
                    child.wait().await.map_err(EngineError::Wait)
                }
            };
            slot.lock().take();
            match &status {
                Ok(status) => tracing::info!("Engine exited: {}", status),
                Err(e) => tracing::error!("Engine wait failed: {}", e),
            }
            status
        });

        Ok(EngineHandle { task })
    }

    /// Forcefully terminates the tracked engine process, if any.
    ///
    /// No graceful shutdown signal is attempted. Calling this with no
    /// engine running, or after the engine already exited, is a silent
    /// no-op.
    pub fn stop(&self) {
        if let Some(kill_tx) = self.kill_slot.lock().take() {
            tracing::info!("Stopping engine");
            // Fails only if the supervision task already finished.
            let _ = kill_tx.send(());
        }
    }
}

/// Relays one output stream line-by-line into the sink.
///
/// Stops silently on EOF or read error; this layer does not distinguish
/// a clean exit from a broken pipe.
async fn relay(stream: LogStream, reader: impl AsyncRead + Unpin, sink: LogSink) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        sink(stream, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn collecting_sink() -> (LogSink, Arc<StdMutex<Vec<(LogStream, String)>>>) {
        let collected = Arc::new(StdMutex::new(Vec::new()));
        let sink_target = Arc::clone(&collected);
        let sink: LogSink = Arc::new(move |stream, line| {
            sink_target.lock().unwrap().push((stream, line));
        });
        (sink, collected)
    }

    async fn wait_for_lines(
        collected: &Arc<StdMutex<Vec<(LogStream, String)>>>,
    ) -> Vec<(LogStream, String)> {
        // Relay tasks can outlive the exit-wait by a beat; poll briefly.
        for _ in 0..50 {
            {
                let lines = collected.lock().unwrap();
                if !lines.is_empty() {
                    return lines.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        collected.lock().unwrap().clone()
    }

    /// Writes an executable shell script standing in for the engine.
    #[cfg(unix)]
    fn fake_engine(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("engine.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let supervisor = EngineSupervisor::new("/nonexistent/engine");
        assert!(!supervisor.is_running());
        supervisor.stop();
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let supervisor = EngineSupervisor::new("/nonexistent/engine");
        let (sink, _) = collecting_sink();
        let err = supervisor
            .start(Path::new("config.json"), sink)
            .unwrap_err();
        assert!(matches!(err, EngineError::Spawn(_)));
        assert!(!supervisor.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relays_stdout_with_config_args() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(&dir, r#"echo "args: $@""#);
        let supervisor = EngineSupervisor::new(&engine);
        let (sink, collected) = collecting_sink();

        let handle = supervisor
            .start(Path::new("config.json"), sink)
            .unwrap();
        let status = handle.wait().await.unwrap();
        assert!(status.success());

        let lines = wait_for_lines(&collected).await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, LogStream::Stdout);
        assert_eq!(lines[0].1, "args: -config config.json");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relays_stderr_lines() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(&dir, "echo boom >&2\nexit 3");
        let supervisor = EngineSupervisor::new(&engine);
        let (sink, collected) = collecting_sink();

        let handle = supervisor
            .start(Path::new("config.json"), sink)
            .unwrap();
        let status = handle.wait().await.unwrap();
        assert!(!status.success());

        let lines = wait_for_lines(&collected).await;
        assert_eq!(lines, vec![(LogStream::Stderr, "boom".to_string())]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_kills_running_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(&dir, "while :; do echo running; sleep 0.05; done");
        let supervisor = EngineSupervisor::new(&engine);
        let (sink, collected) = collecting_sink();

        let handle = supervisor
            .start(Path::new("config.json"), sink)
            .unwrap();
        assert!(supervisor.is_running());

        // Let it produce some output before killing it.
        assert!(!wait_for_lines(&collected).await.is_empty());
        supervisor.stop();

        let status = handle.wait().await.unwrap();
        assert!(!status.success());
        assert!(!supervisor.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_handle_resolves_after_natural_exit() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(&dir, "exit 0");
        let supervisor = EngineSupervisor::new(&engine);
        let (sink, _) = collecting_sink();

        let handle = supervisor
            .start(Path::new("config.json"), sink)
            .unwrap();
        let status = handle.wait().await.unwrap();
        assert!(status.success());
        assert!(!supervisor.is_running());

        // Stop after exit stays a no-op.
        supervisor.stop();
    }
}
