mod config_store;
mod cookie_store;
mod strategy_repository;

pub use config_store::YamlConfigStore;
pub use cookie_store::JsonCookieStore;
pub use strategy_repository::FileStrategyRepository;
