// System Commands
// Preferences, title suggestions and video link checks

use serde::Serialize;
use crate::models::{Preferences, Verification};
use crate::services::{google_drive_guidance, is_google_drive_link, suggest_title, SettingsManager};

/// Result of checking a video source link
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLinkCheck {
    pub is_google_drive: bool,
    /// Sharing guidance, present for Drive links
    pub guidance: Option<String>,
}

pub fn check_video_link(url: &str) -> VideoLinkCheck {
    let is_google_drive = is_google_drive_link(url.trim());
    VideoLinkCheck {
        is_google_drive,
        guidance: is_google_drive.then(|| google_drive_guidance().to_string()),
    }
}

pub fn get_suggested_title() -> String {
    suggest_title()
}

pub fn get_preferences(settings: &SettingsManager) -> Result<Preferences, String> {
    settings.load()
}

pub fn get_verification(settings: &SettingsManager, session_id: &str) -> Verification {
    settings.verification(session_id)
}

pub fn set_verification(
    settings: &SettingsManager,
    session_id: &str,
    verification: Verification,
) -> Result<Verification, String> {
    if session_id.trim().is_empty() {
        return Err("Session id is required".to_string());
    }
    settings.set_verification(session_id, verification)
}
