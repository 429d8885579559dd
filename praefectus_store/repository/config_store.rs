use std::path::PathBuf;
use tracing::debug;

use praefectus_app::{config::Config, repository::ConfigStore};
use praefectus_types::Result;

use crate::{read_optional, write_creating_dirs};

#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ConfigStore for YamlConfigStore {
    async fn load(&self) -> Result<Option<Config>> {
        match read_optional(&self.path).await? {
            Some(contents) => Ok(Some(serde_yaml::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, config: &Config) -> Result<()> {
        let contents = serde_yaml::to_string(config)?;
        write_creating_dirs(&self.path, &contents).await?;
        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use praefectus_app::config::{StrategyConfig, VillageConfig};

    use super::*;
    use crate::test_paths::temp_dir;

    #[tokio::test]
    async fn test_round_trip_keeps_villages() -> Result<()> {
        let dir = temp_dir("config");
        let store = YamlConfigStore::new(dir.join("config.yaml"));
        assert_eq!(store.load().await?, None);

        let mut config = Config::default();
        config.web.server = "en140".to_string();
        config.villages.push(VillageConfig {
            id: 16278,
            name: "Rome & Co".to_string(),
            manage: true,
            strategy: StrategyConfig {
                building: "rush".to_string(),
            },
        });
        store.save(&config).await?;

        assert_eq!(store.load().await?, Some(config));
        tokio::fs::remove_dir_all(dir).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_file_gets_defaults() -> Result<()> {
        let dir = temp_dir("config-partial");
        let path = dir.join("config.yaml");
        write_creating_dirs(&path, "web:\n  server: de200\n  domain: die-staemme.de\n").await?;

        let config = YamlConfigStore::new(&path).load().await?.unwrap();

        assert_eq!(config.version, praefectus_app::config::CONFIG_VERSION);
        assert_eq!(config.base_url(), "https://de200.die-staemme.de");
        assert!(config.villages.is_empty());
        tokio::fs::remove_dir_all(dir).await?;
        Ok(())
    }
}
