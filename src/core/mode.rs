use crate::config::toml_config::ServerConfig;
use crate::core::{EnvSource, LaunchPlan, RuntimeMode};

const FALSE_LIKE: [&str; 4] = ["false", "0", "no", "off"];
const DEFAULT_FORWARDING_DOMAIN: &str = "app.github.dev";

impl RuntimeMode {
    /// Hosted when `indicator` is set to anything other than an empty or
    /// false-like value. A missing variable means local.
    pub fn detect<E: EnvSource + ?Sized>(env: &E, indicator: &str) -> Self {
        match env.var(indicator) {
            Some(value) => {
                let value = value.trim();
                if value.is_empty() || FALSE_LIKE.iter().any(|f| value.eq_ignore_ascii_case(f)) {
                    RuntimeMode::Local
                } else {
                    RuntimeMode::Hosted
                }
            }
            None => RuntimeMode::Local,
        }
    }
}

impl LaunchPlan {
    pub fn for_mode(mode: RuntimeMode, server: &ServerConfig) -> Self {
        let (bind_address, port, headless) = match mode {
            RuntimeMode::Hosted => (server.hosted_address.clone(), server.hosted_port, true),
            RuntimeMode::Local => (server.local_address.clone(), server.port, false),
        };

        Self {
            mode,
            program: server.program.clone(),
            args: server.args.clone(),
            bind_address,
            port,
            headless,
        }
    }
}

/// 雲端工作區的轉發網址；缺少工作區名稱時回傳 None
pub fn hosted_url<E: EnvSource + ?Sized>(env: &E, port: u16) -> Option<String> {
    let name = env.var("CODESPACE_NAME").filter(|n| !n.trim().is_empty())?;
    let domain = env
        .var("GITHUB_CODESPACES_PORT_FORWARDING_DOMAIN")
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FORWARDING_DOMAIN.to_string());
    Some(format!("https://{}-{}.{}", name.trim(), port, domain.trim()))
}

pub fn hosted_access_message<E: EnvSource + ?Sized>(env: &E, port: u16) -> String {
    match hosted_url(env, port) {
        Some(url) => format!("🌐 Hosted workspace detected, dashboard will be available at {}", url),
        None => format!(
            "🌐 Hosted workspace detected, open the forwarded port {} from your workspace's Ports panel",
            port
        ),
    }
}
