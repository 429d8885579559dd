use std::sync::Arc;
use tracing::info;

use praefectus_app::{
    config::Config, discovery::discover_villages, poller::VillagePoller, repository::ConfigStore,
};
use praefectus_store::{FileStrategyRepository, JsonCookieStore, YamlConfigStore};
use praefectus_types::{Result, errors::ApplicationError};
use praefectus_web::{SessionClient, SessionSettings, TribalWarsGateway};

mod console;
mod logs;

use console::ConsoleOperator;
use logs::setup_logging;

#[tokio::main]
#[cfg(not(tarpaulin_include))]
async fn main() -> Result<(), ApplicationError> {
    let config_store = YamlConfigStore::new(Config::path_from_env());
    let log_level = config_store
        .load()
        .await
        .ok()
        .flatten()
        .map(|config| config.bot.log_level);
    let _log_guard = setup_logging(log_level.as_deref());

    info!("Starting bot");
    let operator = Arc::new(ConsoleOperator);
    let mut config = Config::load_or_create(&config_store, operator.as_ref()).await?;

    let gateway = connect(&config, operator.clone()).await?;
    let mut poller = setup_poller(gateway, &mut config, &config_store, operator.as_ref()).await?;

    tokio::select! {
        _ = poller.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Interrupted, shutting down");
        }
    }
    Ok(())
}

async fn connect(config: &Config, operator: Arc<ConsoleOperator>) -> Result<TribalWarsGateway> {
    info!(base_url = %config.base_url(), "Connecting");
    let mut session = SessionClient::new(
        SessionSettings::from_config(config),
        Arc::new(JsonCookieStore::default()),
        operator,
    )?;
    session.connect().await?;

    Ok(TribalWarsGateway::new(session))
}

async fn setup_poller(
    mut gateway: TribalWarsGateway,
    config: &mut Config,
    config_store: &dyn ConfigStore,
    operator: &ConsoleOperator,
) -> Result<VillagePoller> {
    discover_villages(&mut gateway, config, config_store, operator).await?;

    let strategies = Arc::new(FileStrategyRepository::default());
    let poller = VillagePoller::from_config(Box::new(gateway), config, strategies);
    info!(villages = ?poller.village_ids(), "Managing villages");

    Ok(poller)
}
