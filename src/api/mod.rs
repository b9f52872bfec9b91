//! Funifier API client
//!
//! Request execution, route constants and response decoding.

pub mod client;
pub mod response;
pub mod routes;

pub use client::{basic_auth_header, FunifierApi, HttpMethod};
pub use response::{decode_table, extract_count};
