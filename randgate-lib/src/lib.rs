#![forbid(unsafe_code)]

pub mod config;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod security;
pub mod upstream;
pub mod verify;

pub use config::{load, load_from_path, Config};
pub use error::{GatewayError, Result};
pub use gateway::{run, serve, GatewayContext};
pub use security::{client_key, RateLimiter, RateScope};
pub use upstream::UpstreamClient;
