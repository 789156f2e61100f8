use crate::domain::model::LaunchPlan;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Installs the dashboard's dependencies from a requirements file.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, requirements: &Path) -> Result<()>;
}

/// Runs the dashboard server in the foreground until it exits.
#[async_trait]
pub trait DashboardServer: Send + Sync {
    async fn run(&self, plan: &LaunchPlan) -> Result<()>;
}

pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
