use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One submission of the reservation form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReservationRequest {
    pub username: String,
    #[serde(alias = "discordUsername")]
    pub discord_handle: String,
    pub email: String,
}

impl ReservationRequest {
    pub fn new(
        username: impl Into<String>,
        discord_handle: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            discord_handle: discord_handle.into(),
            email: email.into(),
        }
    }
}

/// Result of an availability check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Availability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Availability {
    pub fn available() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// A username that has been claimed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    /// Username as the visitor typed it
    pub username: String,

    /// Lowercase registry key
    pub normalized: String,

    pub discord_handle: String,

    #[serde(skip_serializing)]
    pub email: String,

    pub reserved_at: DateTime<Utc>,
}

impl Reservation {
    pub fn from_request(request: &ReservationRequest) -> Self {
        Self {
            username: request.username.clone(),
            normalized: normalize(&request.username),
            discord_handle: request.discord_handle.clone(),
            email: request.email.clone(),
            reserved_at: Utc::now(),
        }
    }
}

/// Registry key for a username
pub fn normalize(username: &str) -> String {
    username.to_lowercase()
}
