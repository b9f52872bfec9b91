//! Configuration module
//!
//! Connection parameters for the Funifier API, the decoder registry for
//! stored configuration variables, and the application settings file.

pub mod api_config;
pub mod config;
pub mod config_var;

pub use api_config::{ApiConfig, Header, Id, Settings, TypedValue};
pub use config::Config;
pub use config_var::{ConfigEntry, ConfigValue, ConfigVar};
