use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the dashboard is being started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Local,
    Hosted,
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Local => write!(f, "local"),
            RuntimeMode::Hosted => write!(f, "hosted"),
        }
    }
}

/// Outcome of the one-time dependency install gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Installed {
    /// Marker was already present; nothing was run.
    AlreadyPresent,
    /// Installer ran successfully and the marker was written.
    FreshlyInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub mode: RuntimeMode,
    pub program: String,
    pub args: Vec<String>,
    pub bind_address: String,
    pub port: u16,
    pub headless: bool,
}

impl LaunchPlan {
    /// Full argument list passed to the server program.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--server.port".to_string());
        args.push(self.port.to_string());
        args.push("--server.address".to_string());
        args.push(self.bind_address.clone());
        args.push("--server.headless".to_string());
        args.push(self.headless.to_string());
        args
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.command_args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Dry-run output.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub mode: RuntimeMode,
    pub marker_present: bool,
    pub data_dir: String,
    pub plan: LaunchPlan,
    pub hosted_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_args_append_server_flags() {
        let plan = LaunchPlan {
            mode: RuntimeMode::Hosted,
            program: "streamlit".to_string(),
            args: vec!["run".to_string(), "app.py".to_string()],
            bind_address: "0.0.0.0".to_string(),
            port: 8501,
            headless: true,
        };

        assert_eq!(
            plan.command_line(),
            "streamlit run app.py --server.port 8501 --server.address 0.0.0.0 --server.headless true"
        );
    }
}
