// Utility functions
pub mod cache;
pub mod error;
pub mod signature;

pub use cache::*;
pub use error::*;
