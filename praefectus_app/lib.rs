pub mod build_scheduler;
pub mod config;
pub mod countdown;
pub mod discovery;
pub mod events;
pub mod gateway;
pub mod operator;
pub mod poller;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
