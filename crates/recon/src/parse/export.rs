use std::collections::BTreeSet;

use crate::model::{RawLocationEntry, SourceTool};
use crate::sanitize::FrameToken;

use super::is_flame_root;

/// Turns one export into location entries, one per non-empty line.
pub trait ExportParser {
    fn tool(&self) -> SourceTool;

    /// Location path of a line plus the index of its first frame token.
    /// `tokens` is never empty.
    fn split_line(&self, tokens: &[&str]) -> (String, usize);

    fn parse_line(&self, line: &str) -> Option<RawLocationEntry> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }
        let (local_path, frame_start) = self.split_line(&tokens);
        if local_path.is_empty() {
            return None;
        }

        let mut frames = BTreeSet::new();
        let mut dropped_tokens = 0;
        for raw in &tokens[frame_start..] {
            let token = FrameToken::new(raw);
            match token.value {
                Some(frame) => {
                    frames.insert(frame);
                }
                None => {
                    dropped_tokens += 1;
                    log::debug!("{}: dropping frame token '{}' for {}", self.tool(), raw, local_path);
                }
            }
        }

        Some(RawLocationEntry {
            local_path,
            frames,
            dropped_tokens,
        })
    }

    fn parse(&self, content: &str) -> Vec<RawLocationEntry> {
        content.lines().filter_map(|line| self.parse_line(line)).collect()
    }
}

// ---------------------------------------------------------------------------
// Baselight
// ---------------------------------------------------------------------------

/// `<path> <frame> <frame> ...`
pub struct BaselightParser;

impl ExportParser for BaselightParser {
    fn tool(&self) -> SourceTool {
        SourceTool::Baselight
    }

    fn split_line(&self, tokens: &[&str]) -> (String, usize) {
        (tokens[0].to_string(), 1)
    }
}

// ---------------------------------------------------------------------------
// Flame
// ---------------------------------------------------------------------------

/// `<storage-root> <location...> <frame> <frame> ...`
///
/// The location may be split across several tokens; it ends at the first
/// token that is a frame number or a sentinel. Lines without a Flame root
/// fall back to the Baselight shape.
pub struct FlameParser<'a> {
    markers: &'a [String],
}

impl<'a> FlameParser<'a> {
    pub fn new(markers: &'a [String]) -> Self {
        Self { markers }
    }
}

impl ExportParser for FlameParser<'_> {
    fn tool(&self) -> SourceTool {
        SourceTool::Flame
    }

    fn split_line(&self, tokens: &[&str]) -> (String, usize) {
        let root = tokens[0];
        if !is_flame_root(root, self.markers) {
            return (root.to_string(), 1);
        }

        let frame_start = tokens[1..]
            .iter()
            .position(|t| {
                let token = FrameToken::new(t);
                token.is_valid() || token.is_sentinel()
            })
            .map(|i| i + 1)
            .unwrap_or(tokens.len());

        let mut path = root.trim_end_matches('/').to_string();
        for part in &tokens[1..frame_start] {
            let part = part.trim_matches('/');
            if !part.is_empty() {
                path.push('/');
                path.push_str(part);
            }
        }
        (path, frame_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(entry: &RawLocationEntry) -> Vec<u64> {
        entry.frames.iter().copied().collect()
    }

    #[test]
    fn baselight_line() {
        let e = BaselightParser
            .parse_line("/baselightfilesystem1/Dune/reel1/partA/1920x1080 1001 1002 1003")
            .unwrap();
        assert_eq!(e.local_path, "/baselightfilesystem1/Dune/reel1/partA/1920x1080");
        assert_eq!(frames(&e), vec![1001, 1002, 1003]);
        assert_eq!(e.dropped_tokens, 0);
    }

    #[test]
    fn baselight_drops_sentinels_and_dedupes() {
        let e = BaselightParser
            .parse_line("/b/x 10 <err> 11 <null> 10 abc")
            .unwrap();
        assert_eq!(frames(&e), vec![10, 11]);
        assert_eq!(e.dropped_tokens, 3);
    }

    #[test]
    fn all_sentinel_line_keeps_location() {
        let e = BaselightParser.parse_line("/b/x <null> <err>").unwrap();
        assert_eq!(e.local_path, "/b/x");
        assert!(e.frames.is_empty());
        assert_eq!(e.dropped_tokens, 2);
    }

    #[test]
    fn path_only_line_keeps_location() {
        let e = BaselightParser.parse_line("   /b/x   ").unwrap();
        assert!(e.frames.is_empty());
    }

    #[test]
    fn blank_lines_skipped() {
        let entries = BaselightParser.parse("\n  \n/b/x 1\n\n/b/y 2\n");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn flame_location_tokens_joined() {
        let markers = vec!["/net/flame-archive".to_string()];
        let parser = FlameParser::new(&markers);
        let e = parser
            .parse_line("/net/flame-archive Dune/reel1/VFX/Hydraulx 1260 1261 1262")
            .unwrap();
        assert_eq!(e.local_path, "/net/flame-archive/Dune/reel1/VFX/Hydraulx");
        assert_eq!(frames(&e), vec![1260, 1261, 1262]);

        let e = parser
            .parse_line("/net/flame-archive Dune reel1 VFX <null> 5")
            .unwrap();
        assert_eq!(e.local_path, "/net/flame-archive/Dune/reel1/VFX");
        assert_eq!(frames(&e), vec![5]);
        assert_eq!(e.dropped_tokens, 1);
    }

    #[test]
    fn flame_root_only() {
        let markers = vec!["/net/flame-archive".to_string()];
        let e = FlameParser::new(&markers).parse_line("/net/flame-archive").unwrap();
        assert_eq!(e.local_path, "/net/flame-archive");
        assert!(e.frames.is_empty());
    }

    #[test]
    fn flame_line_without_root_uses_first_token() {
        let markers = vec!["/net/flame-archive".to_string()];
        let e = FlameParser::new(&markers).parse_line("/other/place 7 8").unwrap();
        assert_eq!(e.local_path, "/other/place");
        assert_eq!(frames(&e), vec![7, 8]);
    }
}
