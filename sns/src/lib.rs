//! Read-only analytics API over time-sharded social media indices

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod metrics;
pub mod query;
pub mod repository;
pub mod search;

pub use config::Config;
pub use error::{Error, Result};
