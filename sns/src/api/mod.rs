//! HTTP surface: request validation, handlers and router

mod error;
mod params;
mod response;
mod routes;
mod server;

pub use error::ApiError;
pub use params::{DAY_FORMAT, MAX_COUNT, MAX_IDS, MAX_TRANSITIONS, MINUTE_FORMAT};
pub use response::{DomainTweets, Hits, MediaTweets};
pub use server::{ApiServer, AppState};
