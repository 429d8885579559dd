use std::path::PathBuf;
use tracing::debug;

use praefectus_app::repository::StrategyRepository;
use praefectus_game::models::strategy::StrategyPlan;
use praefectus_types::{Result, errors::AppError};

use crate::read_optional;

pub const DEFAULT_STRATEGY_DIR: &str = "strategy";

/// Strategy files under `<root>/building/<name>.txt`.
#[derive(Debug, Clone)]
pub struct FileStrategyRepository {
    root: PathBuf,
}

impl FileStrategyRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn building_path(&self, name: &str) -> PathBuf {
        self.root.join("building").join(format!("{name}.txt"))
    }
}

impl Default for FileStrategyRepository {
    fn default() -> Self {
        Self::new(DEFAULT_STRATEGY_DIR)
    }
}

#[async_trait::async_trait]
impl StrategyRepository for FileStrategyRepository {
    async fn building_plan(&self, name: &str) -> Result<StrategyPlan> {
        // Names come from the config; keep them inside the strategy folder.
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(AppError::StrategyNotFound(name.to_string()).into());
        }

        let path = self.building_path(name);
        let Some(contents) = read_optional(&path).await? else {
            return Err(AppError::StrategyNotFound(name.to_string()).into());
        };

        let plan = StrategyPlan::parse(name, &contents)?;
        debug!(strategy = name, entries = plan.len(), "Building strategy loaded");
        Ok(plan)
    }
}
