use crate::core::{DashboardServer, Installer, LaunchPlan};
use crate::utils::error::{LauncherError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::signal;

const MAX_DIAGNOSTIC_CHARS: usize = 2000;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Runs `<program> <args...> <requirements>`, e.g. `pip install -r requirements.txt`.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install(&self, requirements: &Path) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.kill_on_drop(true);
        command.args(&self.args);
        command.arg(requirements);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let child = command.spawn().map_err(|source| LauncherError::InstallSpawn {
            program: self.program.clone(),
            source,
        })?;
        let output = child.wait_with_output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(LauncherError::InstallFailed {
                program: self.program.clone(),
                code: output.status.code(),
                diagnostic: summarize_process_failure(&stderr, &stdout),
            });
        }

        if let Some(last) = stdout.lines().rev().find(|line| !line.trim().is_empty()) {
            tracing::debug!("{}: {}", self.program, last.trim());
        }
        Ok(())
    }
}

fn summarize_process_failure(stderr: &str, stdout: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return tail_for_log(stderr);
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return tail_for_log(stdout);
    }
    "no output".to_string()
}

/// 安裝工具的錯誤通常在輸出最後面
fn tail_for_log(text: &str) -> String {
    let count = text.chars().count();
    if count <= MAX_DIAGNOSTIC_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - MAX_DIAGNOSTIC_CHARS).collect();
    format!("...{}", tail)
}

/// Starts the dashboard in the foreground with inherited stdio.
#[derive(Debug, Clone)]
pub struct CommandServer {
    working_dir: PathBuf,
    shutdown_grace: Duration,
}

impl CommandServer {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// How long a signalled server may take to stop before it is killed.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

#[async_trait]
impl DashboardServer for CommandServer {
    async fn run(&self, plan: &LaunchPlan) -> Result<()> {
        let mut command = Command::new(&plan.program);
        command.kill_on_drop(true);
        command.args(plan.command_args());
        command.current_dir(&self.working_dir);

        let mut child = command.spawn().map_err(|source| LauncherError::ServerSpawn {
            program: plan.program.clone(),
            source,
        })?;
        tracing::debug!("Dashboard server started with pid {:?}", child.id());

        let status = tokio::select! {
            status = child.wait() => status?,
            received = shutdown_signal() => {
                tracing::info!("🛑 {:?} received, waiting for dashboard server to stop", received);
                // Ctrl+C 已由終端機送到同一個行程群組，只有 SIGTERM 需要轉送
                if received == ShutdownSignal::Terminate {
                    forward_terminate(&mut child);
                }

                match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
                    Ok(status) => status?,
                    Err(_) => {
                        tracing::warn!(
                            "Dashboard server did not stop within {:?}, killing it",
                            self.shutdown_grace
                        );
                        if let Err(e) = child.start_kill() {
                            tracing::debug!("Dashboard server already gone: {}", e);
                        }
                        child.wait().await?;
                        return Err(LauncherError::Interrupted);
                    }
                }
            }
        };

        exit_status_to_result(status)
    }
}

fn exit_status_to_result(status: ExitStatus) -> Result<()> {
    if status.success() {
        tracing::info!("Dashboard server exited cleanly");
        return Ok(());
    }

    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal = None;

    Err(LauncherError::ServerExited {
        code: status.code(),
        signal,
    })
}

#[cfg(unix)]
fn forward_terminate(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    // SAFETY: pid belongs to a child we have not reaped yet.
    let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if result != 0 {
        tracing::debug!(
            "Failed to forward SIGTERM to {}: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn forward_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!("Dashboard server already gone: {}", e);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Resolves on Ctrl+C or SIGTERM. Never resolves if no handler can be installed.
async fn shutdown_signal() -> ShutdownSignal {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => ShutdownSignal::Interrupt,
        _ = terminate => ShutdownSignal::Terminate,
    }
}
