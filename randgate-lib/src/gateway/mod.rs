//! HTTP surface: routing, authentication, rate-limit enforcement and
//! response shaping around the delivery pipeline.

mod context;
mod handler;
mod http_result;
mod query;
mod response;
mod server;

pub use context::GatewayContext;
pub use handler::handle_request;
pub use server::{run, serve};
