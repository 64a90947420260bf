use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

// -- Messages --

/// Body of POST/PUT/DELETE on `/messages`. Which fields are required
/// depends on the operation, so everything defaults to empty here and the
/// message service decides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageInput {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, with = "crate::timestamp::option")]
    pub last_updated_date: Option<DateTime<Utc>>,
}

// -- Users --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

/// Returned once from POST /users: the only time the raw key is visible.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    #[serde(flatten)]
    pub user: User,
    pub api_key: String,
}

// -- Errors --

/// 400 response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "ErrorMsg")]
    pub error_msg: String,
}
