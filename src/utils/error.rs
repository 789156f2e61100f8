use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Failed to parse configuration '{field}': {message}")]
    ConfigParseError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot create data directory {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot access install marker {}: {source}", .path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dependency file not found: {}", .path.display())]
    MissingRequirements { path: PathBuf },

    #[error("Failed to start installer '{program}': {source}")]
    InstallSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dependency installation failed with status {}: {diagnostic}", display_code(.code))]
    InstallFailed {
        program: String,
        code: Option<i32>,
        diagnostic: String,
    },

    #[error("Failed to start dashboard server '{program}': {source}")]
    ServerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dashboard server exited with {}", display_status(.code, .signal))]
    ServerExited {
        code: Option<i32>,
        signal: Option<i32>,
    },

    #[error("Port {port} on {address} is already in use")]
    PortInUse { address: String, port: u16 },

    #[error("Interrupted by shutdown signal")]
    Interrupted,
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|value| value.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

fn display_status(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("status {}", code),
        (None, Some(signal)) => format!("signal {}", signal),
        (None, None) => "unknown status".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Filesystem,
    Dependency,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl LauncherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LauncherError::ConfigError { .. }
            | LauncherError::ConfigParseError { .. }
            | LauncherError::InvalidConfigValueError { .. }
            | LauncherError::SerializationError(_) => ErrorCategory::Configuration,
            LauncherError::IoError(_)
            | LauncherError::DataDir { .. }
            | LauncherError::Marker { .. } => ErrorCategory::Filesystem,
            LauncherError::MissingRequirements { .. }
            | LauncherError::InstallSpawn { .. }
            | LauncherError::InstallFailed { .. } => ErrorCategory::Dependency,
            LauncherError::ServerSpawn { .. }
            | LauncherError::ServerExited { .. }
            | LauncherError::PortInUse { .. }
            | LauncherError::Interrupted => ErrorCategory::Server,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Dependency | ErrorCategory::Server => ErrorSeverity::High,
            ErrorCategory::Filesystem => ErrorSeverity::Critical,
        }
    }

    /// 程序結束碼：伺服器自身的非零狀態會原樣傳回，被訊號終止時為 128 + 訊號
    pub fn exit_code(&self) -> i32 {
        match self {
            LauncherError::ServerExited { code: Some(code), .. } if *code != 0 => return *code,
            LauncherError::ServerExited { code: None, signal: Some(signal) } => return 128 + signal,
            LauncherError::Interrupted => return 130,
            _ => {}
        }

        match self.category() {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Filesystem => 3,
            ErrorCategory::Dependency => 4,
            ErrorCategory::Server => 5,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LauncherError::ConfigError { .. }
            | LauncherError::ConfigParseError { .. }
            | LauncherError::InvalidConfigValueError { .. } => {
                "Check launcher.toml (or remove it to use the defaults)".to_string()
            }
            LauncherError::SerializationError(_) => {
                "Re-run without --dry-run to launch directly".to_string()
            }
            LauncherError::IoError(_) | LauncherError::DataDir { .. } | LauncherError::Marker { .. } => {
                "Check that the working directory exists and is writable".to_string()
            }
            LauncherError::MissingRequirements { path } => format!(
                "Create {} or point [paths] requirements at the right file",
                path.display()
            ),
            LauncherError::InstallSpawn { program, .. } => {
                format!("Make sure '{}' is installed and on PATH", program)
            }
            LauncherError::InstallFailed { .. } => {
                "Fix the installer error above and run the launcher again; nothing was marked as installed"
                    .to_string()
            }
            LauncherError::ServerSpawn { program, .. } => format!(
                "Make sure '{}' is installed; delete the install marker to force a reinstall",
                program
            ),
            LauncherError::ServerExited { .. } => {
                "Check the dashboard server output above".to_string()
            }
            LauncherError::Interrupted => "Run the launcher again to restart the dashboard".to_string(),
            LauncherError::PortInUse { port, .. } => format!(
                "Stop the process using port {} or change [server] port in launcher.toml",
                port
            ),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid launcher configuration: {}", self),
            ErrorCategory::Filesystem => format!("Could not prepare the working directory: {}", self),
            ErrorCategory::Dependency => format!("Could not install dependencies: {}", self),
            ErrorCategory::Server => format!("Could not run the dashboard: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
