// SettingsManager Service
// Persists quick start conveniences and manual verification status

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use crate::models::{Preferences, Verification};

const PREFERENCES_FILE: &str = "preferences.json";

/// Manages preference storage and retrieval.
///
/// Single-user conveniences: no cross-process locking, last writer wins.
pub struct SettingsManager {
    preferences_path: PathBuf,
    cache: RwLock<Option<Preferences>>,
}

impl SettingsManager {
    /// Create a new SettingsManager with the given app data directory
    pub fn new(app_data_dir: &Path) -> Self {
        Self {
            preferences_path: app_data_dir.join(PREFERENCES_FILE),
            cache: RwLock::new(None),
        }
    }

    pub fn preferences_path(&self) -> &Path {
        &self.preferences_path
    }

    /// Load preferences from disk, or return defaults if not found
    pub fn load(&self) -> Result<Preferences, String> {
        if let Ok(cache) = self.cache.read() {
            if let Some(ref preferences) = *cache {
                return Ok(preferences.clone());
            }
        }

        let preferences = if self.preferences_path.exists() {
            let content = std::fs::read_to_string(&self.preferences_path)
                .map_err(|e| format!("Failed to read preferences: {e}"))?;
            serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse preferences: {e}"))?
        } else {
            Preferences::default()
        };

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(preferences.clone());
        }

        Ok(preferences)
    }

    /// Load, falling back to defaults when the file is unreadable
    fn load_or_default(&self) -> Preferences {
        self.load().unwrap_or_else(|e| {
            log::warn!("Using default preferences: {e}");
            Preferences::default()
        })
    }

    /// Save preferences to disk
    pub fn save(&self, preferences: &Preferences) -> Result<(), String> {
        if let Some(parent) = self.preferences_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create preferences directory: {e}"))?;
        }

        let content = serde_json::to_string_pretty(preferences)
            .map_err(|e| format!("Failed to serialize preferences: {e}"))?;
        std::fs::write(&self.preferences_path, content)
            .map_err(|e| format!("Failed to write preferences: {e}"))?;

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(preferences.clone());
        }

        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Preferences)) -> Result<(), String> {
        let mut preferences = self.load_or_default();
        apply(&mut preferences);
        self.save(&preferences)
    }

    pub fn last_title(&self) -> Option<String> {
        self.load_or_default().last_title
    }

    pub fn set_last_title(&self, title: &str) -> Result<(), String> {
        self.update(|p| p.last_title = Some(title.to_string()))
    }

    pub fn last_video_url(&self) -> Option<String> {
        self.load_or_default().last_video_url
    }

    pub fn set_last_video_url(&self, url: &str) -> Result<(), String> {
        self.update(|p| p.last_video_url = Some(url.to_string()))
    }

    /// Verification status for a session; `not-checked` when nothing is stored
    pub fn verification(&self, session_id: &str) -> Verification {
        self.load_or_default()
            .verifications
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Store a verification, stamping the current time
    pub fn set_verification(&self, session_id: &str, verification: Verification) -> Result<Verification, String> {
        let stamped = Verification {
            last_checked: Some(chrono::Utc::now().timestamp_millis()),
            ..verification
        };
        let stored = stamped.clone();
        self.update(move |p| {
            p.verifications.insert(session_id.to_string(), stored);
        })?;
        Ok(stamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationStatus;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path());

        assert_eq!(manager.last_title(), None);
        assert_eq!(manager.verification("s1").status, VerificationStatus::NotChecked);
        assert!(!manager.preferences_path().exists());
    }

    #[test]
    fn test_values_survive_reload() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path());
        manager.set_last_title("Cozy Hearth - Evening").unwrap();
        manager.set_last_video_url("https://example.com/fire.mp4").unwrap();

        let reloaded = SettingsManager::new(temp.path());
        assert_eq!(reloaded.last_title().as_deref(), Some("Cozy Hearth - Evening"));
        assert_eq!(reloaded.last_video_url().as_deref(), Some("https://example.com/fire.mp4"));
    }

    #[test]
    fn test_verification_is_stamped() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path());
        let saved = manager
            .set_verification(
                "s1",
                Verification {
                    status: VerificationStatus::Verified,
                    youtube_url: Some("https://youtube.com/watch?v=abc".into()),
                    last_checked: None,
                },
            )
            .unwrap();

        assert!(saved.last_checked.is_some());
        let loaded = SettingsManager::new(temp.path()).verification("s1");
        assert_eq!(loaded, saved);
        assert_eq!(manager.verification("other").status, VerificationStatus::NotChecked);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(PREFERENCES_FILE), "{not json").unwrap();
        let manager = SettingsManager::new(temp.path());

        assert!(manager.load().is_err());
        assert_eq!(manager.last_title(), None);
        manager.set_last_title("Recovered").unwrap();
        assert_eq!(manager.last_title().as_deref(), Some("Recovered"));
    }
}
