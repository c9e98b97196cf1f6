pub mod logging;
pub mod platform;

pub use logging::{init_driver_logging, init_logging};
