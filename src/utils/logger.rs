use crate::config::toml_config::LogFormat;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日誌一律寫到 stderr，stdout 留給 dry-run 的 JSON 與伺服器輸出
pub fn init_cli_logger(verbose: bool, format: LogFormat) {
    cli_subscriber(verbose, format, std::io::stderr).init();
}

pub fn cli_subscriber<W>(
    verbose: bool,
    format: LogFormat,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dash_launcher=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dash_launcher=info"))
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => Box::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.compact()),
        ),
        // 給雲端工作區的日誌收集器使用
        LogFormat::Json => Box::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.json()),
        ),
    }
}
