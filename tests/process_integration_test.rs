#![cfg(unix)]

use anyhow::Result;
use dash_launcher::{
    ensure_dependencies_installed, CommandInstaller, CommandServer, DashboardServer, Installed,
    Installer, LaunchPlan, LauncherError, RuntimeMode,
};
use tempfile::TempDir;

fn shell_plan(script: &str) -> LaunchPlan {
    LaunchPlan {
        mode: RuntimeMode::Local,
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        bind_address: "127.0.0.1".to_string(),
        port: 8501,
        headless: false,
    }
}

#[tokio::test]
async fn test_successful_install_command_latches_marker() -> Result<()> {
    let dir = TempDir::new()?;
    let requirements = dir.path().join("requirements.txt");
    std::fs::write(&requirements, "streamlit\n")?;
    let marker = dir.path().join(".installed");

    let installer = CommandInstaller::new("sh", vec!["-c".to_string(), "echo installed".to_string()]);
    let installed = ensure_dependencies_installed(&marker, &requirements, &installer).await?;

    assert_eq!(installed, Installed::FreshlyInstalled);
    assert!(marker.is_file());
    Ok(())
}

#[tokio::test]
async fn test_failing_install_command_reports_diagnostics() -> Result<()> {
    let dir = TempDir::new()?;
    let requirements = dir.path().join("requirements.txt");
    std::fs::write(&requirements, "streamlit\n")?;
    let marker = dir.path().join(".installed");

    let installer = CommandInstaller::new(
        "sh",
        vec![
            "-c".to_string(),
            "echo 'ERROR: No matching distribution found' >&2; exit 7".to_string(),
        ],
    );
    let err = ensure_dependencies_installed(&marker, &requirements, &installer)
        .await
        .unwrap_err();

    match err {
        LauncherError::InstallFailed { code, diagnostic, .. } => {
            assert_eq!(code, Some(7));
            assert!(diagnostic.contains("No matching distribution"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_install_program_is_a_spawn_error() -> Result<()> {
    let dir = TempDir::new()?;
    let requirements = dir.path().join("requirements.txt");
    std::fs::write(&requirements, "streamlit\n")?;

    let installer = CommandInstaller::new("dash-launcher-no-such-pip", vec![]);
    let err = installer.install(&requirements).await.unwrap_err();

    assert!(matches!(err, LauncherError::InstallSpawn { .. }));
    Ok(())
}

#[tokio::test]
async fn test_server_clean_exit() -> Result<()> {
    let dir = TempDir::new()?;
    let server = CommandServer::new(dir.path());

    server.run(&shell_plan("exit 0")).await?;
    Ok(())
}

#[tokio::test]
async fn test_server_runs_in_working_dir_with_flags() -> Result<()> {
    let dir = TempDir::new()?;
    let server = CommandServer::new(dir.path());

    // $0 會是第一個附加參數 --server.port
    server
        .run(&shell_plan(r#"printf '%s %s\n' "$0" "$*" > launched.txt"#))
        .await?;

    let recorded = std::fs::read_to_string(dir.path().join("launched.txt"))?;
    assert_eq!(
        recorded.trim(),
        "--server.port 8501 --server.address 127.0.0.1 --server.headless false"
    );
    Ok(())
}

#[tokio::test]
async fn test_server_nonzero_exit_is_propagated() -> Result<()> {
    let dir = TempDir::new()?;
    let server = CommandServer::new(dir.path());

    let err = server.run(&shell_plan("exit 3")).await.unwrap_err();

    assert!(matches!(err, LauncherError::ServerExited { code: Some(3), .. }));
    assert_eq!(err.exit_code(), 3);
    Ok(())
}

#[tokio::test]
async fn test_server_killed_by_signal_exits_with_128_plus_signal() -> Result<()> {
    let dir = TempDir::new()?;
    let server = CommandServer::new(dir.path());

    let err = server.run(&shell_plan("kill -KILL $$")).await.unwrap_err();

    assert!(matches!(
        err,
        LauncherError::ServerExited {
            code: None,
            signal: Some(9)
        }
    ));
    assert_eq!(err.exit_code(), 137);
    Ok(())
}

#[tokio::test]
async fn test_missing_server_program_is_a_spawn_error() -> Result<()> {
    let dir = TempDir::new()?;
    let server = CommandServer::new(dir.path());
    let mut plan = shell_plan("exit 0");
    plan.program = "dash-launcher-no-such-streamlit".to_string();

    let err = server.run(&plan).await.unwrap_err();
    assert!(matches!(err, LauncherError::ServerSpawn { .. }));
    Ok(())
}
