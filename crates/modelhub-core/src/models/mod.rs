//! Data models for the model management API.
//!
//! - `UserProfile`: the authenticated account as returned by `/users/me`
//! - `Dataset`, `Model`: named resources owned by a user
//! - `Training`: an experiment pairing a model with a dataset, with scores
//!
//! Server timestamps arrive as `%Y/%m/%d %H:%M:%S` strings and are kept
//! verbatim; `parse_server_timestamp` turns them into `NaiveDateTime`.

pub mod dataset;
pub mod model;
pub mod training;
pub mod user;

pub use dataset::{Dataset, DatasetCreate};
pub use model::{Model, ModelCreate};
pub use training::{Training, TrainingCreate};
pub use user::{Acknowledgement, UserProfile};

use chrono::NaiveDateTime;

/// Timestamp format used by the server for `creation_date` and `registration_date`.
pub const SERVER_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Parse a server timestamp, returning `None` for anything that doesn't match.
pub fn parse_server_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), SERVER_TIMESTAMP_FORMAT).ok()
}
