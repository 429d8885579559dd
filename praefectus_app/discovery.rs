use std::collections::HashSet;
use tracing::info;

use praefectus_game::models::poll::VillageListing;
use praefectus_types::Result;

use crate::{config::Config, gateway::GameGateway, operator::Operator, repository::ConfigStore};

/// Adds villages of the account that the config doesn't know yet.
///
/// New villages are created from `village_template`; whether they are managed
/// comes from `bot.auto_manage_new_villages` or, when that's off, from the
/// operator. Returns the villages that were added.
pub async fn discover_villages(
    gateway: &mut dyn GameGateway,
    config: &mut Config,
    store: &dyn ConfigStore,
    operator: &dyn Operator,
) -> Result<Vec<VillageListing>> {
    info!("Getting villages");
    let listed = gateway.list_villages().await?;

    // The overview may list one id under several names; the first one wins.
    let mut seen = HashSet::new();
    let new_villages: Vec<VillageListing> = listed
        .into_iter()
        .filter(|listing| seen.insert(listing.id))
        .filter(|listing| config.village(listing.id).is_err())
        .collect();

    if new_villages.is_empty() {
        return Ok(new_villages);
    }

    for listing in &new_villages {
        let manage = config.bot.auto_manage_new_villages
            || operator
                .ask_bool(&format!("Manage village \"{}\"?", listing.name), false)
                .await?;

        info!(village_id = listing.id, name = %listing.name, manage, "New village found");
        let village = config.village_template.instantiate(listing, manage);
        config.villages.push(village);
    }

    store.save(config).await?;
    Ok(new_villages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{StrategyConfig, VillageConfig},
        test_utils::tests::{InMemoryConfigStore, MockGateway, MockOperator},
    };

    fn listing(id: u32, name: &str) -> VillageListing {
        VillageListing {
            id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_new_villages_are_added_from_template() -> Result<()> {
        let mut config = Config {
            villages: vec![VillageConfig {
                id: 1,
                name: "Known".to_string(),
                manage: true,
                strategy: StrategyConfig {
                    building: "custom".to_string(),
                },
            }],
            ..Default::default()
        };
        let mut gateway = MockGateway::new().with_villages(vec![
            listing(1, "Known"),
            listing(2, "Second"),
            listing(3, "Third"),
        ]);
        let operator = MockOperator::new().with_confirmations(&[true, false]);
        let store = InMemoryConfigStore::new(None);

        let added = discover_villages(&mut gateway, &mut config, &store, &operator).await?;

        assert_eq!(added, vec![listing(2, "Second"), listing(3, "Third")]);
        assert_eq!(operator.questions().len(), 2);
        assert_eq!(config.villages.len(), 3);
        assert!(config.village(2)?.manage);
        assert!(!config.village(3)?.manage);
        assert_eq!(config.village(1)?.strategy.building, "custom");
        assert_eq!(
            config.village(2)?.strategy.building,
            config.village_template.strategy.building
        );
        assert_eq!(store.saved().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_auto_manage_skips_questions() -> Result<()> {
        let mut config = Config::default();
        config.bot.auto_manage_new_villages = true;
        let mut gateway = MockGateway::new().with_villages(vec![listing(5, "Fifth")]);
        let operator = MockOperator::new();
        let store = InMemoryConfigStore::new(None);

        discover_villages(&mut gateway, &mut config, &store, &operator).await?;

        assert!(operator.questions().is_empty());
        assert!(config.village(5)?.manage);
        Ok(())
    }

    #[tokio::test]
    async fn test_village_listed_twice_is_added_once() -> Result<()> {
        let mut config = Config::default();
        config.bot.auto_manage_new_villages = true;
        let mut gateway = MockGateway::new().with_villages(vec![
            listing(7, "Seventh"),
            listing(7, "Seventh (renamed)"),
            listing(8, "Eighth"),
        ]);
        let store = InMemoryConfigStore::new(None);

        let added =
            discover_villages(&mut gateway, &mut config, &store, &MockOperator::new()).await?;

        assert_eq!(added, vec![listing(7, "Seventh"), listing(8, "Eighth")]);
        assert_eq!(config.villages.iter().filter(|v| v.id == 7).count(), 1);
        assert_eq!(config.villages.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_nothing_new_does_not_save() -> Result<()> {
        let mut config = Config {
            villages: vec![VillageConfig {
                id: 1,
                name: "Known".to_string(),
                manage: true,
                strategy: Default::default(),
            }],
            ..Default::default()
        };
        let mut gateway = MockGateway::new().with_villages(vec![listing(1, "Known")]);
        let store = InMemoryConfigStore::new(None);

        let added =
            discover_villages(&mut gateway, &mut config, &store, &MockOperator::new()).await?;

        assert!(added.is_empty());
        assert!(store.saved().is_empty());
        Ok(())
    }
}
