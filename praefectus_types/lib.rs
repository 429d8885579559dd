pub mod buildings;
pub mod errors;

pub use errors::Result;
