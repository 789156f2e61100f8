use crate::config::toml_config::LauncherConfig;
use crate::core::mode::{hosted_access_message, hosted_url};
use crate::core::{DashboardServer, EnvSource, Installed, Installer, LaunchPlan, LaunchReport, RuntimeMode};
use crate::utils::error::{LauncherError, Result};
use std::path::Path;

/// Create the data directory if it does not exist yet.
pub fn ensure_data_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| LauncherError::DataDir {
        path: path.to_path_buf(),
        source,
    })
}

pub fn marker_present(marker: &Path) -> Result<bool> {
    marker.try_exists().map_err(|source| LauncherError::Marker {
        path: marker.to_path_buf(),
        source,
    })
}

/// One-time dependency install gate.
///
/// The marker is only written after the installer reports success, so a
/// failed install is retried on the next launch.
pub async fn ensure_dependencies_installed<I: Installer + ?Sized>(
    marker: &Path,
    requirements: &Path,
    installer: &I,
) -> Result<Installed> {
    if marker_present(marker)? {
        tracing::debug!("Install marker {} present, skipping install", marker.display());
        return Ok(Installed::AlreadyPresent);
    }

    if !requirements.is_file() {
        return Err(LauncherError::MissingRequirements {
            path: requirements.to_path_buf(),
        });
    }

    tracing::info!("📦 Installing dependencies from {}", requirements.display());
    installer.install(requirements).await?;

    std::fs::File::create(marker).map_err(|source| LauncherError::Marker {
        path: marker.to_path_buf(),
        source,
    })?;
    tracing::info!("✅ Dependencies installed, marker written to {}", marker.display());

    Ok(Installed::FreshlyInstalled)
}

/// 啟動前確認連接埠可用；只有「已被占用」會視為錯誤
pub async fn check_port_available(address: &str, port: u16) -> Result<()> {
    match tokio::net::TcpListener::bind((address, port)).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => Err(LauncherError::PortInUse {
            address: address.to_string(),
            port,
        }),
        Err(e) => {
            tracing::warn!("Port preflight on {}:{} inconclusive: {}", address, port, e);
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub installed: Installed,
    pub plan: LaunchPlan,
}

pub struct Bootstrap<I: Installer, S: DashboardServer, E: EnvSource> {
    config: LauncherConfig,
    installer: I,
    server: S,
    env: E,
}

impl<I: Installer, S: DashboardServer, E: EnvSource> Bootstrap<I, S, E> {
    pub fn new(config: LauncherConfig, installer: I, server: S, env: E) -> Self {
        Self {
            config,
            installer,
            server,
            env,
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn detect_mode(&self) -> RuntimeMode {
        RuntimeMode::detect(&self.env, &self.config.hosted.indicator)
    }

    /// Resolve everything a launch would do without touching the filesystem
    /// or starting any process.
    pub fn report(&self) -> Result<LaunchReport> {
        let mode = self.detect_mode();
        let plan = LaunchPlan::for_mode(mode, &self.config.server);
        let hosted_url = match mode {
            RuntimeMode::Hosted => hosted_url(&self.env, plan.port),
            RuntimeMode::Local => None,
        };

        Ok(LaunchReport {
            mode,
            marker_present: marker_present(&self.config.marker_path())?,
            data_dir: self.config.data_dir().display().to_string(),
            plan,
            hosted_url,
        })
    }

    /// Run the bootstrap steps in order and block until the dashboard exits.
    pub async fn run(&self) -> Result<LaunchOutcome> {
        let data_dir = self.config.data_dir();
        ensure_data_dir(&data_dir)?;
        tracing::debug!("Data directory ready at {}", data_dir.display());

        let installed = ensure_dependencies_installed(
            &self.config.marker_path(),
            &self.config.requirements_path(),
            &self.installer,
        )
        .await?;

        let mode = self.detect_mode();
        tracing::info!("🔧 Runtime mode: {}", mode);
        let plan = LaunchPlan::for_mode(mode, &self.config.server);

        if mode == RuntimeMode::Hosted {
            tracing::info!("{}", hosted_access_message(&self.env, plan.port));
        }

        if self.config.server.preflight_port_check {
            check_port_available(&plan.bind_address, plan.port).await?;
        }

        tracing::info!("🚀 Starting dashboard: {}", plan.command_line());
        self.server.run(&plan).await?;

        Ok(LaunchOutcome { installed, plan })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingInstaller {
        calls: AtomicUsize,
        succeed: bool,
    }

    impl CountingInstaller {
        fn new(succeed: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                succeed,
            }
        }
    }

    #[async_trait]
    impl Installer for CountingInstaller {
        async fn install(&self, _requirements: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(())
            } else {
                Err(LauncherError::InstallFailed {
                    program: "pip".to_string(),
                    code: Some(1),
                    diagnostic: "resolution impossible".to_string(),
                })
            }
        }
    }

    fn workdir_with_requirements() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "streamlit\n").unwrap();
        dir
    }

    #[test]
    fn ensure_data_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");

        ensure_data_dir(&data).unwrap();
        ensure_data_dir(&data).unwrap();
        assert!(data.is_dir());
    }

    #[test]
    fn ensure_data_dir_reports_path_on_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = ensure_data_dir(&blocker.join("nested")).unwrap_err();
        assert!(matches!(err, LauncherError::DataDir { .. }));
    }

    #[tokio::test]
    async fn fresh_install_runs_once_and_writes_marker() {
        let dir = workdir_with_requirements();
        let marker = dir.path().join(".installed");
        let requirements = dir.path().join("requirements.txt");
        let installer = CountingInstaller::new(true);

        let first = ensure_dependencies_installed(&marker, &requirements, &installer)
            .await
            .unwrap();
        let second = ensure_dependencies_installed(&marker, &requirements, &installer)
            .await
            .unwrap();

        assert_eq!(first, Installed::FreshlyInstalled);
        assert_eq!(second, Installed::AlreadyPresent);
        assert_eq!(installer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::metadata(&marker).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn failed_install_leaves_no_marker() {
        let dir = workdir_with_requirements();
        let marker = dir.path().join(".installed");
        let installer = CountingInstaller::new(false);

        let result =
            ensure_dependencies_installed(&marker, &dir.path().join("requirements.txt"), &installer)
                .await;

        assert!(matches!(result, Err(LauncherError::InstallFailed { .. })));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn missing_requirements_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join(".installed");
        let installer = CountingInstaller::new(true);

        let result =
            ensure_dependencies_installed(&marker, &dir.path().join("requirements.txt"), &installer)
                .await;

        assert!(matches!(result, Err(LauncherError::MissingRequirements { .. })));
        assert_eq!(installer.calls.load(Ordering::SeqCst), 0);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn existing_marker_skips_requirements_check() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join(".installed");
        std::fs::File::create(&marker).unwrap();
        let installer = CountingInstaller::new(false);

        let result =
            ensure_dependencies_installed(&marker, &dir.path().join("requirements.txt"), &installer)
                .await
                .unwrap();

        assert_eq!(result, Installed::AlreadyPresent);
        assert_eq!(installer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn occupied_port_is_detected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = check_port_available("127.0.0.1", port).await;
        assert!(matches!(result, Err(LauncherError::PortInUse { port: p, .. }) if p == port));

        drop(listener);
    }

    #[test]
    fn report_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let mut config = LauncherConfig::default();
        config.paths.working_dir = dir.path().display().to_string();

        struct NoServer;
        #[async_trait]
        impl DashboardServer for NoServer {
            async fn run(&self, _plan: &LaunchPlan) -> Result<()> {
                unreachable!("report must not launch")
            }
        }

        let env: HashMap<String, String> =
            [("CODESPACES".to_string(), "true".to_string())].into_iter().collect();
        let bootstrap = Bootstrap::new(config, CountingInstaller::new(true), NoServer, env);
        let report = bootstrap.report().unwrap();

        assert_eq!(report.mode, RuntimeMode::Hosted);
        assert!(!report.marker_present);
        assert!(report.plan.headless);
        assert!(!dir.path().join("data").exists());
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct CleanServer;

    #[async_trait]
    impl DashboardServer for CleanServer {
        async fn run(&self, _plan: &LaunchPlan) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn hosted_access_message_is_reported_once() {
        let dir = TempDir::new().unwrap();
        std::fs::File::create(dir.path().join(".installed")).unwrap();
        let mut config = LauncherConfig::default();
        config.paths.working_dir = dir.path().display().to_string();
        config.server.preflight_port_check = false;

        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = crate::utils::logger::cli_subscriber(
            false,
            crate::config::toml_config::LogFormat::Compact,
            move || sink.clone(),
        );
        let _default = tracing::subscriber::set_default(subscriber);

        let env: HashMap<String, String> = [
            ("CODESPACES".to_string(), "true".to_string()),
            ("CODESPACE_NAME".to_string(), "fuzzy-lamp".to_string()),
        ]
        .into_iter()
        .collect();
        let bootstrap = Bootstrap::new(config, CountingInstaller::new(true), CleanServer, env);
        bootstrap.run().await.unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            output
                .matches("https://fuzzy-lamp-8501.app.github.dev")
                .count(),
            1
        );
    }
}
