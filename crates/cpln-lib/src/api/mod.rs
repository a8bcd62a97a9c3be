//! Control Plane API transport
//!
//! A thin `reqwest` client implementing the discovery fetcher traits.

mod client;
mod config;

pub use self::client::ApiClient;
pub use self::config::{ClientConfig, DEFAULT_ENDPOINT};
