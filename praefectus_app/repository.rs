use async_trait::async_trait;
use std::collections::BTreeMap;

use praefectus_game::models::strategy::StrategyPlan;
use praefectus_types::Result;

use crate::config::Config;

/// Session cookies, by name.
pub type CookieMap = BTreeMap<String, String>;

#[async_trait]
pub trait CookieStore: Send + Sync {
    async fn load(&self) -> Result<Option<CookieMap>>;
    async fn save(&self, cookies: &CookieMap) -> Result<()>;
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<Option<Config>>;
    async fn save(&self, config: &Config) -> Result<()>;
}

#[async_trait]
pub trait StrategyRepository: Send + Sync {
    /// Loads a building strategy by name.
    async fn building_plan(&self, name: &str) -> Result<StrategyPlan>;
}
