use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::parse_server_timestamp;

/// A model registered with the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Model {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub user_is_admin: bool,
}

impl Model {
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.creation_date.as_deref().and_then(parse_server_timestamp)
    }
}

/// Payload for creating a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ModelCreate {
    pub name: String,
}

impl ModelCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
