// Preset Parser
// Imports stream presets from pasted document text

use crate::models::{ParseResult, StreamPreset, PRESET_BEGIN, PRESET_END};

/// Which preset field a line key maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PresetKey {
    Title,
    VideoLink,
    IngestUrl,
    StreamKey,
}

impl PresetKey {
    /// Match a lower-cased key against the accepted synonyms
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "title" => Some(Self::Title),
            "video" | "videolink" | "video link" => Some(Self::VideoLink),
            "ingest" | "ingesturl" | "ingest url" | "rtmp" | "rtmp url" => Some(Self::IngestUrl),
            "key" | "streamkey" | "stream key" => Some(Self::StreamKey),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct PartialPreset {
    title: Option<String>,
    video_link: Option<String>,
    ingest_url: Option<String>,
    stream_key: Option<String>,
}

impl PartialPreset {
    fn set(&mut self, key: PresetKey, value: String) {
        let slot = match key {
            PresetKey::Title => &mut self.title,
            PresetKey::VideoLink => &mut self.video_link,
            PresetKey::IngestUrl => &mut self.ingest_url,
            PresetKey::StreamKey => &mut self.stream_key,
        };
        *slot = Some(value);
    }

    fn finish(self) -> Result<StreamPreset, String> {
        match (self.title, self.video_link, self.ingest_url, self.stream_key) {
            (Some(title), Some(video_link), Some(ingest_url), Some(stream_key)) => Ok(StreamPreset {
                title,
                video_link,
                ingest_url,
                stream_key,
            }),
            _ => Err("Missing required fields".to_string()),
        }
    }
}

/// Parse every `---PRESET-BEGIN---` / `---PRESET-END---` block in `text`.
///
/// Text outside the markers is ignored. Each block is parsed on its own; a
/// bad block adds an error and the remaining blocks are still processed.
pub fn parse_presets(text: &str) -> ParseResult {
    let mut result = ParseResult::default();

    if text.is_empty() {
        result.errors.push("No text provided".to_string());
        return result;
    }

    let blocks = extract_blocks(text, &mut result.errors);

    if blocks.is_empty() {
        result.errors.push(format!(
            "No valid preset blocks found. Make sure to wrap presets with {PRESET_BEGIN} and {PRESET_END} markers."
        ));
        return result;
    }

    for (index, block) in blocks.iter().enumerate() {
        match parse_block(block) {
            Ok(preset) => result.presets.push(preset),
            Err(e) => result.errors.push(format!("Preset block {}: {e}", index + 1)),
        }
    }

    log::debug!(
        "Parsed {} preset(s) from {} block(s), {} error(s)",
        result.presets.len(),
        blocks.len(),
        result.errors.len()
    );

    result
}

/// Pair begin/end markers left to right, returning trimmed block contents.
/// An unterminated begin marker records an error and ends the scan.
fn extract_blocks<'a>(text: &'a str, errors: &mut Vec<String>) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut position = 0;

    while let Some(offset) = text[position..].find(PRESET_BEGIN) {
        let content_start = position + offset + PRESET_BEGIN.len();

        let Some(end_offset) = text[content_start..].find(PRESET_END) else {
            errors.push("Found PRESET-BEGIN without matching PRESET-END".to_string());
            break;
        };

        let content_end = content_start + end_offset;
        blocks.push(text[content_start..content_end].trim());
        position = content_end + PRESET_END.len();
    }

    blocks
}

fn parse_block(block: &str) -> Result<StreamPreset, String> {
    let mut preset = PartialPreset::default();

    for line in block.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if let Some(key) = PresetKey::from_key(&key.trim().to_lowercase()) {
            preset.set(key, value.to_string());
        }
    }

    preset.finish()
}

/// Format description shown next to the import box
pub fn preset_format_instructions() -> String {
    format!(
        "Copy and paste text in this exact format:

{PRESET_BEGIN}
Title: Cozy Fireplace Stream
Video Link: https://drive.google.com/file/d/YOUR_FILE_ID/view
Ingest URL: rtmp://a.rtmp.youtube.com/live2
Stream Key: xxxx-xxxx-xxxx-xxxx
{PRESET_END}

You can include multiple presets. Each preset must:
• Start with {PRESET_BEGIN}
• End with {PRESET_END}
• Include all four fields (Title, Video Link, Ingest URL, Stream Key)
• Use the exact field names shown above

Any text outside the markers will be ignored."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{validate_fields, youtube_adapter};

    fn preset(title: &str) -> StreamPreset {
        StreamPreset {
            title: title.to_string(),
            video_link: "https://drive.google.com/file/d/abc123/view".to_string(),
            ingest_url: "rtmp://a.rtmp.youtube.com/live2".to_string(),
            stream_key: "abcd-efgh-ijkl-mnop".to_string(),
        }
    }

    #[test]
    fn test_no_markers() {
        let result = parse_presets("Title: Something\nStream Key: abc");
        assert!(result.presets.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("---PRESET-BEGIN---"));
        assert!(result.errors[0].contains("---PRESET-END---"));
    }

    #[test]
    fn test_empty_text() {
        let result = parse_presets("");
        assert!(result.presets.is_empty());
        assert_eq!(result.errors, vec!["No text provided"]);
    }

    #[test]
    fn test_block_round_trip() {
        let original = preset("Cozy Fireplace - Evening");
        let result = parse_presets(&original.to_block());

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.presets, vec![original]);
    }

    #[test]
    fn test_two_blocks_in_order_with_surrounding_text() {
        let text = format!(
            "Notes from the doc\n{}\nmore chatter\n{}trailing",
            preset("First").to_block(),
            preset("Second").to_block()
        );
        let result = parse_presets(&text);

        assert!(result.errors.is_empty());
        let titles: Vec<&str> = result.presets.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_unterminated_block_after_valid_one() {
        let text = format!("{}\n---PRESET-BEGIN---\nTitle: Lost", preset("Only").to_block());
        let result = parse_presets(&text);

        assert_eq!(result.presets.len(), 1);
        assert_eq!(result.errors, vec!["Found PRESET-BEGIN without matching PRESET-END"]);
    }

    #[test]
    fn test_only_unterminated_block() {
        let result = parse_presets("---PRESET-BEGIN---\nTitle: Lost");
        assert!(result.presets.is_empty());
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0], "Found PRESET-BEGIN without matching PRESET-END");
        assert!(result.errors[1].starts_with("No valid preset blocks found"));
    }

    #[test]
    fn test_missing_stream_key_reports_block_position() {
        let text = format!(
            "{}---PRESET-BEGIN---\nTitle: Second\nVideo: https://example.com/v.mp4\nIngest: rtmp://a.rtmp.youtube.com/live2\n---PRESET-END---",
            preset("First").to_block()
        );
        let result = parse_presets(&text);

        assert_eq!(result.presets.len(), 1);
        assert_eq!(result.errors, vec!["Preset block 2: Missing required fields"]);
    }

    #[test]
    fn test_synonyms_case_and_extra_lines() {
        let text = "---PRESET-BEGIN---
  TITLE : Morning Stream
VideoLink: https://example.com/v.mp4
RTMP URL: rtmp://a.rtmp.youtube.com/live2
Note: ignored annotation
this line has no colon
StreamKey: key:with:colons
---PRESET-END---";
        let result = parse_presets(text);

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let parsed = &result.presets[0];
        assert_eq!(parsed.title, "Morning Stream");
        assert_eq!(parsed.video_link, "https://example.com/v.mp4");
        assert_eq!(parsed.ingest_url, "rtmp://a.rtmp.youtube.com/live2");
        assert_eq!(parsed.stream_key, "key:with:colons");
    }

    #[test]
    fn test_empty_value_is_missing() {
        let text = "---PRESET-BEGIN---\nTitle:\nVideo: v\nIngest: i\nKey: k\n---PRESET-END---";
        let result = parse_presets(text);
        assert!(result.presets.is_empty());
        assert_eq!(result.errors, vec!["Preset block 1: Missing required fields"]);
    }

    #[test]
    fn test_crlf_lines() {
        let text = "---PRESET-BEGIN---\r\nTitle: T\r\nVideo: v\r\nIngest: i\r\nKey: k\r\n---PRESET-END---";
        let result = parse_presets(text);
        assert_eq!(result.presets.len(), 1);
        assert_eq!(result.presets[0].stream_key, "k");
    }

    #[test]
    fn test_preset_applies_to_youtube_adapter() {
        let values = preset("Applied").to_field_values();
        assert!(validate_fields(&youtube_adapter(), &values).is_valid());
    }

    #[test]
    fn test_instructions_show_markers() {
        let instructions = preset_format_instructions();
        assert!(instructions.contains(PRESET_BEGIN));
        assert!(instructions.contains("Stream Key:"));
    }
}
