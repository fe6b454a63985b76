// Application layer - use cases and orchestration over the storage ports

pub mod error;
mod service;

pub use error::*;
pub use service::*;
