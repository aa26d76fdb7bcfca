//! Client for a university community platform.
//!
//! The HTTP wrapper lives in [`api`], the TTL response cache in [`cache`],
//! optimistic updates with rollback in [`optimistic`] and paginated list
//! controllers in [`feed`]. The terminal front end ([`app`], [`ui`]) is a thin
//! resource feed on top of those.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod logging;
pub mod notify;
pub mod optimistic;
pub mod prefs;
pub mod storage;
pub mod ui;
pub mod validate;
