// Preferences Model
// Local conveniences remembered between runs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Manual check of whether a platform is receiving the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    #[default]
    NotChecked,
    Verified,
    NotReceiving,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub status: VerificationStatus,

    /// Watch page the user checked against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,

    /// Unix millis of the last update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<i64>,
}

/// Persisted preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub last_title: Option<String>,

    #[serde(default)]
    pub last_video_url: Option<String>,

    /// Per session id
    #[serde(default)]
    pub verifications: HashMap<String, Verification>,
}
