//! REST API client and service wrappers.

mod auth;
mod cached;
mod client;
mod comments;
mod error;
mod groups;
mod page;
mod polls;
mod resources;
mod saved;
#[cfg(test)]
mod stub_server;
pub mod types;

pub use cached::CachedApi;
pub use client::{ApiClient, Params};
pub use error::ApiError;
pub use page::Page;
pub use resources::ResourceQuery;
