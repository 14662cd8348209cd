pub mod config;
pub mod error;
pub mod types;

pub use config::RailchatConfig;
pub use error::{RailchatError, Result};
pub use types::*;
