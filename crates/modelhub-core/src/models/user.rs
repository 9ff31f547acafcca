use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::parse_server_timestamp;

/// The account behind a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub registration_date: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserProfile {
    pub fn registered_at(&self) -> Option<NaiveDateTime> {
        self.registration_date.as_deref().and_then(parse_server_timestamp)
    }

    pub fn role_display(&self) -> &'static str {
        if self.is_admin {
            "admin"
        } else {
            "user"
        }
    }
}

/// `{"message": "..."}` body returned by delete endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: String,
}
