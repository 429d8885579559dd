use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use tracing::{info, warn};

use praefectus_game::{models::poll::VillageListing, scheduler::PlanLimits};
use praefectus_types::{
    Result,
    errors::{AppError, ApplicationError},
};

use crate::{operator::Operator, repository::ConfigStore};

/// Bumped whenever new settings are introduced; older files get re-saved.
pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_STRATEGY: &str = "purple_predator";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub web: WebConfig,
    pub bot: BotConfig,
    pub session: SessionConfig,
    pub building_manager: BuildingManagerConfig,
    pub village_template: VillageTemplate,
    pub villages: Vec<VillageConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub server: String,
    pub domain: String,
    pub user_agent: String,
    /// Overrides the `https://{server}.{domain}` address.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub log_level: String,
    pub auto_manage_new_villages: bool,
    pub delays: DelayConfig,
}

/// Delays in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub between_villages: u64,
    pub between_runs: u64,
    pub request: RequestDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDelay {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_refresh_attempts: u32,
    pub max_captcha_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingManagerConfig {
    pub queue_size: usize,
    pub finish_enabled: bool,
    pub upgrade_enabled: bool,
    pub lookahead: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub building: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VillageTemplate {
    pub manage: bool,
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillageConfig {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub manage: bool,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            web: Default::default(),
            bot: Default::default(),
            session: Default::default(),
            building_manager: Default::default(),
            village_template: Default::default(),
            villages: vec![],
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            server: "nl95".to_string(),
            domain: "tribalwars.nl".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: None,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            auto_manage_new_villages: false,
            delays: Default::default(),
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            between_villages: 5,
            between_runs: 180,
            request: Default::default(),
        }
    }
}

impl Default for RequestDelay {
    fn default() -> Self {
        Self { min: 1.0, max: 3.0 }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_refresh_attempts: 3,
            max_captcha_attempts: 3,
        }
    }
}

impl Default for BuildingManagerConfig {
    fn default() -> Self {
        Self {
            queue_size: 2,
            finish_enabled: true,
            upgrade_enabled: true,
            lookahead: 2,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            building: DEFAULT_STRATEGY.to_string(),
        }
    }
}

impl Default for VillageTemplate {
    fn default() -> Self {
        Self {
            manage: true,
            strategy: Default::default(),
        }
    }
}

impl VillageTemplate {
    pub fn instantiate(&self, listing: &VillageListing, manage: bool) -> VillageConfig {
        VillageConfig {
            id: listing.id,
            name: listing.name.clone(),
            manage,
            strategy: self.strategy.clone(),
        }
    }
}

impl BuildingManagerConfig {
    pub fn plan_limits(&self) -> PlanLimits {
        PlanLimits {
            queue_capacity: self.queue_size,
            lookahead: self.lookahead,
        }
    }
}

impl Config {
    /// Path of the config file, from `PRAEFECTUS_CONFIG` (a `.env` file is
    /// honored) or `config.yaml`.
    pub fn path_from_env() -> PathBuf {
        dotenv().ok();

        match env::var("PRAEFECTUS_CONFIG") {
            Ok(val) => PathBuf::from(val),
            Err(_) => PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn base_url(&self) -> String {
        match &self.web.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}", self.web.server, self.web.domain),
        }
    }

    pub fn village(&self, village_id: u32) -> Result<&VillageConfig, AppError> {
        self.villages
            .iter()
            .find(|v| v.id == village_id)
            .ok_or(AppError::VillageNotConfigured(village_id))
    }

    pub fn managed_villages(&self) -> impl Iterator<Item = &VillageConfig> {
        self.villages.iter().filter(|v| v.manage)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let request = self.bot.delays.request;
        if request.min < 0.0 || request.min > request.max {
            return Err(AppError::InvalidConfig(format!(
                "request delay bounds [{}, {}] are invalid",
                request.min, request.max
            )));
        }
        if self.building_manager.queue_size == 0 {
            return Err(AppError::InvalidConfig(
                "building_manager.queue_size must be at least 1".to_string(),
            ));
        }
        if self.session.max_refresh_attempts == 0 {
            return Err(AppError::InvalidConfig(
                "session.max_refresh_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the stored configuration, upgrading older files and asking the
    /// operator for connection details on first run.
    pub async fn load_or_create(
        store: &dyn ConfigStore,
        operator: &dyn Operator,
    ) -> Result<Config, ApplicationError> {
        let config = match store.load().await? {
            Some(mut config) => {
                info!("Loading config file");
                if config.version < CONFIG_VERSION {
                    warn!(
                        from = config.version,
                        to = CONFIG_VERSION,
                        "Config file is outdated, updating it"
                    );
                    config.version = CONFIG_VERSION;
                    store.save(&config).await?;
                }
                config
            }
            None => {
                info!("Config file not found, creating a new one");
                let config = Self::ask_connection(operator).await?;
                store.save(&config).await?;
                config
            }
        };

        config.validate()?;
        Ok(config)
    }

    async fn ask_connection(operator: &dyn Operator) -> Result<Config, ApplicationError> {
        let defaults = WebConfig::default();
        let server = operator
            .ask_string("Enter the server", Some(&defaults.server), None)
            .await?;
        let domain = operator
            .ask_string("Enter the domain", Some(&defaults.domain), None)
            .await?;
        let user_agent = operator
            .ask_string("Enter the user agent", Some(&defaults.user_agent), None)
            .await?;

        Ok(Config {
            web: WebConfig {
                server,
                domain,
                user_agent,
                base_url: None,
            },
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{InMemoryConfigStore, MockOperator};

    #[test]
    fn test_missing_keys_take_defaults() {
        let yaml = "version: 1\nweb:\n  server: en140\n  domain: tribalwars.net\nbuilding_manager:\n  lookahead: 4\nvillages:\n  - id: 12\n    name: Home\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.base_url(), "https://en140.tribalwars.net");
        assert_eq!(config.web.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.building_manager.lookahead, 4);
        assert_eq!(config.building_manager.queue_size, 2);
        assert!(config.building_manager.finish_enabled);
        assert_eq!(config.bot.delays.between_runs, 180);

        let village = config.village(12).unwrap();
        assert!(!village.manage);
        assert_eq!(village.strategy.building, DEFAULT_STRATEGY);
        assert!(matches!(
            config.village(13),
            Err(AppError::VillageNotConfigured(13))
        ));
    }

    #[test]
    fn test_base_url_override() {
        let config = Config {
            web: WebConfig {
                base_url: Some("http://127.0.0.1:8088/".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://127.0.0.1:8088");
    }

    #[test]
    fn test_validate_rejects_inverted_request_delay() {
        let mut config = Config::default();
        config.bot.delays.request = RequestDelay { min: 3.0, max: 1.0 };
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));

        config.bot.delays.request = RequestDelay { min: 0.0, max: 0.0 };
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_first_run_asks_operator_and_saves() -> Result<()> {
        let store = InMemoryConfigStore::new(None);
        let operator = MockOperator::new()
            .with_answers(&["en140", "tribalwars.net", ""]);

        let config = Config::load_or_create(&store, &operator).await?;

        assert_eq!(config.web.server, "en140");
        assert_eq!(config.web.domain, "tribalwars.net");
        assert_eq!(config.web.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(store.saved().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_outdated_config_is_upgraded() -> Result<()> {
        let old = Config {
            version: 0,
            ..Default::default()
        };
        let store = InMemoryConfigStore::new(Some(old));
        let operator = MockOperator::new();

        let config = Config::load_or_create(&store, &operator).await?;

        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(store.saved().last().map(|c| c.version), Some(CONFIG_VERSION));
        assert!(operator.questions().is_empty());
        Ok(())
    }
}
