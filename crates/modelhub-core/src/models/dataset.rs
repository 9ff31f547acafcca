use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::parse_server_timestamp;

/// A dataset registered with the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub user_is_admin: bool,
}

impl Dataset {
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.creation_date.as_deref().and_then(parse_server_timestamp)
    }
}

/// Payload for creating a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DatasetCreate {
    pub name: String,
}

impl DatasetCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
