//! Device self-identification line matching
//!
//! Devices announce themselves once at boot (and may re-announce later) with
//! a single line in one of two encodings:
//!
//! - `{"id":"<id>","board":"<board>"}`
//! - `[NODEID:<id>:<board>]`

use regex::Regex;
use serde::Deserialize;

/// Identification carried by a matched announcement line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationResult {
    pub device_id: String,
    pub board_type: String,
}

/// JSON announcement payload
#[derive(Debug, Deserialize)]
struct JsonAnnouncement {
    id: String,
    board: String,
}

/// Matches the recognized self-identification encodings against single
/// lines of monitor output.
///
/// Encodings are tried in a fixed order and the first match wins. Malformed
/// or unrelated lines are plain non-matches, never errors. New encodings
/// are added by appending another `match_*` step.
pub struct IdentificationMatcher {
    node_id_pattern: Regex,
}

impl IdentificationMatcher {
    pub fn new() -> Self {
        Self {
            node_id_pattern: Regex::new(r"^\[NODEID:([^:\]]+):([^:\]]+)\]$")
                .expect("NODEID pattern is a valid regex"),
        }
    }

    /// Try each encoding in order and return the first match.
    pub fn matches(&self, line: &str) -> Option<IdentificationResult> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        self.match_json(line).or_else(|| self.match_node_id(line))
    }

    fn match_json(&self, line: &str) -> Option<IdentificationResult> {
        if !line.starts_with('{') {
            return None;
        }
        let parsed: JsonAnnouncement = serde_json::from_str(line).ok()?;
        if parsed.id.is_empty() || parsed.board.is_empty() {
            return None;
        }
        Some(IdentificationResult {
            device_id: parsed.id,
            board_type: parsed.board,
        })
    }

    fn match_node_id(&self, line: &str) -> Option<IdentificationResult> {
        let caps = self.node_id_pattern.captures(line)?;
        Some(IdentificationResult {
            device_id: caps[1].to_string(),
            board_type: caps[2].to_string(),
        })
    }
}

impl Default for IdentificationMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(device_id: &str, board_type: &str) -> IdentificationResult {
        IdentificationResult {
            device_id: device_id.to_string(),
            board_type: board_type.to_string(),
        }
    }

    #[test]
    fn matches_json_announcement() {
        let matcher = IdentificationMatcher::new();
        assert_eq!(
            matcher.matches(r#"{"id":"CubeCell","board":"HTCC-AB01"}"#),
            Some(ident("CubeCell", "HTCC-AB01"))
        );
    }

    #[test]
    fn matches_node_id_announcement() {
        let matcher = IdentificationMatcher::new();
        assert_eq!(
            matcher.matches("[NODEID:abc:XYZ]"),
            Some(ident("abc", "XYZ"))
        );
    }

    #[test]
    fn matches_with_surrounding_whitespace() {
        let matcher = IdentificationMatcher::new();
        assert_eq!(
            matcher.matches("  [NODEID:n1:esp32dev]\r"),
            Some(ident("n1", "esp32dev"))
        );
    }

    #[test]
    fn rejects_unrelated_lines() {
        let matcher = IdentificationMatcher::new();
        assert_eq!(matcher.matches("hello world"), None);
        assert_eq!(matcher.matches(""), None);
        assert_eq!(matcher.matches("E (123) wifi: disconnect"), None);
    }

    #[test]
    fn rejects_malformed_announcements() {
        let matcher = IdentificationMatcher::new();
        // Truncated JSON and missing fields
        assert_eq!(matcher.matches(r#"{"id":"CubeCell""#), None);
        assert_eq!(matcher.matches(r#"{"id":"CubeCell"}"#), None);
        assert_eq!(matcher.matches(r#"{"id":"","board":"HTCC-AB01"}"#), None);
        // Wrong arity and empty segments in the bracketed form
        assert_eq!(matcher.matches("[NODEID:abc]"), None);
        assert_eq!(matcher.matches("[NODEID:abc:x:y]"), None);
        assert_eq!(matcher.matches("[NODEID::XYZ]"), None);
    }
}
