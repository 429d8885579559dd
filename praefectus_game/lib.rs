pub mod models;
pub mod scheduler;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
