pub mod config;
pub mod error;

pub use config::{default_config_path, NulldrvConfig};
pub use error::CoreError;
