//! Liveness endpoint for hosting platforms that probe an HTTP port.

pub mod server;

pub use server::{build_router, start, ServerConfig, ServerHandle};
