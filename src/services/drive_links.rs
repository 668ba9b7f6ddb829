// Drive Links
// Detects Google Drive share links used as video sources

use regex::Regex;
use std::sync::OnceLock;

const DRIVE_PATTERNS: &[&str] = &[
    r"(?i)drive\.google\.com/file/d/",
    r"(?i)drive\.google\.com/open\?id=",
    r"(?i)drive\.google\.com/uc\?id=",
    r"(?i)docs\.google\.com/.*/d/",
];

fn drive_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DRIVE_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

pub fn is_google_drive_link(url: &str) -> bool {
    !url.is_empty() && drive_patterns().iter().any(|pattern| pattern.is_match(url))
}

/// Sharing requirements shown when a Drive link is used as a source
pub fn google_drive_guidance() -> &'static str {
    "Google Drive links require specific sharing settings:
• Set sharing to \"Anyone with the link\" (public access)
• Private/restricted links will fail to load
• For video files, consider using the direct download link format
• Test the link in an incognito window to verify public access"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_drive_links() {
        assert!(is_google_drive_link("https://drive.google.com/file/d/abc123/view"));
        assert!(is_google_drive_link("https://DRIVE.google.com/open?id=abc"));
        assert!(is_google_drive_link("https://drive.google.com/uc?id=abc&export=download"));
        assert!(is_google_drive_link("https://docs.google.com/document/d/xyz/edit"));
    }

    #[test]
    fn test_ignores_other_links() {
        assert!(!is_google_drive_link(""));
        assert!(!is_google_drive_link("https://example.com/video.mp4"));
        assert!(!is_google_drive_link("rtmp://a.rtmp.youtube.com/live2"));
    }
}
