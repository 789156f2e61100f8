use clap::Parser;
use dash_launcher::config::toml_config::config_source_message;
use dash_launcher::utils::{logger, validation::Validate};
use dash_launcher::{
    Bootstrap, CommandInstaller, CommandServer, LauncherArgs, LauncherConfig, LauncherError,
    ProcessEnv,
};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let args = LauncherArgs::parse();

    // 日誌格式來自配置檔，所以先載入配置，載入結果在日誌初始化後才記錄
    let (located, config) = match LauncherConfig::locate(args.config.as_deref()) {
        Ok(path) => {
            let config = LauncherConfig::from_located(path.as_deref());
            (Some(path), config)
        }
        Err(e) => (None, Err(e)),
    };
    let format = config
        .as_ref()
        .map(|c| c.logging.format)
        .unwrap_or_default();
    logger::init_cli_logger(args.verbose, format);

    tracing::info!("Starting dash-launcher");
    if let Some(path) = &located {
        tracing::info!("{}", config_source_message(path.as_deref()));
    }

    let config = match config.and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    tracing::debug!("Launcher config: {:?}", config);

    let installer = CommandInstaller::new(config.install.program.clone(), config.install.args.clone());
    let server = CommandServer::new(config.working_dir())
        .with_shutdown_grace(Duration::from_secs(config.server.shutdown_grace_seconds));
    let bootstrap = Bootstrap::new(config, installer, server, ProcessEnv);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be installed or started");
        let rendered = bootstrap
            .report()
            .and_then(|report| serde_json::to_string_pretty(&report).map_err(LauncherError::from));
        match rendered {
            Ok(json) => println!("{}", json),
            Err(e) => exit_with(e),
        }
        return;
    }

    match bootstrap.run().await {
        Ok(outcome) => {
            tracing::info!(
                "✅ Dashboard stopped (mode: {}, install: {:?})",
                outcome.plan.mode,
                outcome.installed
            );
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: LauncherError) -> ! {
    tracing::error!(
        "❌ Launch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}
