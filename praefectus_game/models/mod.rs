pub mod costs;
pub mod poll;
pub mod queue;
pub mod strategy;
pub mod village;
