pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::LauncherArgs;

pub use adapters::process::{CommandInstaller, CommandServer};
pub use config::toml_config::LauncherConfig;
pub use crate::core::bootstrap::{
    ensure_data_dir, ensure_dependencies_installed, Bootstrap, LaunchOutcome,
};
pub use domain::model::{Installed, LaunchPlan, LaunchReport, RuntimeMode};
pub use domain::ports::{DashboardServer, EnvSource, Installer, ProcessEnv};
pub use utils::error::{LauncherError, Result};
