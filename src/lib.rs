pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod query;
pub mod services;
pub mod utils;

pub use api::FunifierApi;
pub use error::{FunifierError, Result};
