//! HTTP API: uploads, downloads and service info

pub mod auth;
pub mod middleware;
pub mod routes;
mod server;
pub mod types;

pub use server::{ApiServer, build_router};
