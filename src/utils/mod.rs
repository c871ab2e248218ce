pub mod config;
pub mod errors;

pub use config::{AppConfig, ApiConfig, PatchStrategy, TranslationDefaults};
pub use errors::{L10nError, Result};
