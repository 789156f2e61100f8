pub mod bootstrap;
pub mod mode;

pub use crate::domain::model::{Installed, LaunchPlan, LaunchReport, RuntimeMode};
pub use crate::domain::ports::{DashboardServer, EnvSource, Installer, ProcessEnv};
pub use crate::utils::error::Result;
