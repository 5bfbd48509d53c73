mod loader;
mod types;

pub use loader::{load, load_from_path};
pub use types::{Config, RateLimitConfig, ScopeConfig};
