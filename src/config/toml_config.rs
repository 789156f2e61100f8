use crate::utils::error::{LauncherError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "launcher.toml";
pub const DEFAULT_PORT: u16 = 8501;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub paths: PathsConfig,
    pub install: InstallConfig,
    pub server: ServerConfig,
    pub hosted: HostedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub working_dir: String,
    pub data_dir: String,
    pub marker: String,
    pub requirements: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            working_dir: ".".to_string(),
            data_dir: "data".to_string(),
            marker: ".installed".to_string(),
            requirements: "requirements.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub program: String,
    /// 需求檔路徑會附加在最後
    pub args: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            program: "pip".to_string(),
            args: vec!["install".to_string(), "-r".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub port: u16,
    pub hosted_port: u16,
    pub local_address: String,
    pub hosted_address: String,
    pub preflight_port_check: bool,
    /// 收到停止訊號後等待伺服器自行結束的秒數
    pub shutdown_grace_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "streamlit".to_string(),
            args: vec!["run".to_string(), "app.py".to_string()],
            port: DEFAULT_PORT,
            hosted_port: DEFAULT_PORT,
            local_address: "127.0.0.1".to_string(),
            hosted_address: "0.0.0.0".to_string(),
            preflight_port_check: true,
            shutdown_grace_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedConfig {
    pub indicator: String,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            indicator: "CODESPACES".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl LauncherConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LauncherError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LauncherError::ConfigParseError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 找出要讀取的配置檔；明確指定的檔案必須存在，預設檔不存在時回傳 None
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        match explicit {
            Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
            Some(path) => Err(LauncherError::ConfigError {
                message: format!("config file '{}' does not exist", path.display()),
            }),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                Ok(default_path.exists().then(|| default_path.to_path_buf()))
            }
        }
    }

    /// 讀取 `locate` 找到的配置檔，沒有檔案時使用預設值
    pub fn from_located(located: Option<&Path>) -> Result<Self> {
        match located {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_located(Self::locate(explicit)?.as_deref())
    }

    /// 替換環境變數 (例如 ${APP_PORT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LauncherError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        Path::new(&self.paths.working_dir).join(relative)
    }

    pub fn working_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.working_dir)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.paths.data_dir)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.resolve(&self.paths.marker)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.resolve(&self.paths.requirements)
    }
}

/// Log line describing where the configuration came from.
pub fn config_source_message(located: Option<&Path>) -> String {
    match located {
        Some(path) => format!("📁 Loading configuration from: {}", path.display()),
        None => format!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE),
    }
}

impl Validate for LauncherConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("paths.working_dir", &self.paths.working_dir)?;
        validation::validate_path("paths.data_dir", &self.paths.data_dir)?;
        validation::validate_path("paths.marker", &self.paths.marker)?;
        validation::validate_path("paths.requirements", &self.paths.requirements)?;

        validation::validate_non_empty_string("install.program", &self.install.program)?;
        validation::validate_non_empty_string("server.program", &self.server.program)?;

        validation::validate_port("server.port", self.server.port)?;
        validation::validate_port("server.hosted_port", self.server.hosted_port)?;
        validation::validate_ip_address("server.local_address", &self.server.local_address)?;
        validation::validate_ip_address("server.hosted_address", &self.server.hosted_address)?;

        validation::validate_env_var_name("hosted.indicator", &self.hosted.indicator)?;

        Ok(())
    }
}
