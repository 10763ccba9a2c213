// Trafmon Library - Public API

// Re-export error types
pub mod error;
pub use error::{Result, TrafmonError};

// Module declarations
pub mod commands;
pub mod core;

// Re-export commonly used types
pub use crate::core::store::Store;

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
