pub mod cookies;
pub mod gateway;
pub mod parser;
pub mod session;
pub mod tokens;

pub use gateway::TribalWarsGateway;
pub use session::{SessionClient, SessionSettings};
