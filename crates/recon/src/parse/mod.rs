//! Export and work-order parsers.
//!
//! Exports are told apart by content, not by filename: the leading path
//! token of each line carries a tool-specific root marker. Classification
//! is a closed set and fails closed.

mod export;
mod filename;
mod xytech;

pub use export::{BaselightParser, ExportParser, FlameParser};
pub use filename::identify;
pub use xytech::parse_work_order;

use crate::config::FormatConfig;
use crate::error::ReconError;
use crate::model::{ParsedSource, SourceFile, SourceTool};

/// Outcome of content-based format detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Baselight,
    Flame,
    Unrecognized,
}

impl Classification {
    pub fn tool(self) -> Option<SourceTool> {
        match self {
            Self::Baselight => Some(SourceTool::Baselight),
            Self::Flame => Some(SourceTool::Flame),
            Self::Unrecognized => None,
        }
    }
}

/// Classify an export by the first line whose leading token carries a known
/// root marker. Flame markers are checked first on each line since a Flame
/// root could otherwise contain a Baselight-looking segment.
pub fn classify(content: &str, formats: &FormatConfig) -> Classification {
    for line in content.lines() {
        let Some(token) = line.split_whitespace().next() else {
            continue;
        };
        if is_flame_root(token, &formats.flame_markers) {
            return Classification::Flame;
        }
        if is_baselight_path(token, &formats.baselight_markers) {
            return Classification::Baselight;
        }
    }
    Classification::Unrecognized
}

pub(crate) fn is_flame_root(token: &str, markers: &[String]) -> bool {
    markers.iter().filter(|m| !m.is_empty()).any(|m| {
        let m = m.trim_end_matches('/');
        token == m || token.strip_prefix(m).is_some_and(|rest| rest.starts_with('/'))
    })
}

fn is_baselight_path(token: &str, markers: &[String]) -> bool {
    if !token.starts_with('/') {
        return false;
    }
    token
        .split('/')
        .filter(|seg| !seg.is_empty())
        .any(|seg| markers.iter().filter(|m| !m.is_empty()).any(|m| seg.starts_with(m.as_str())))
}

/// Classify, parse and attribute one export.
///
/// `Err` only for [`ReconError::UnrecognizedFormat`]. A filename that cannot be
/// attributed is reported through the returned warning, with the frames
/// still parsed.
pub fn parse_source(
    source: &SourceFile,
    formats: &FormatConfig,
) -> Result<(ParsedSource, Option<ReconError>), ReconError> {
    let tool = classify(&source.content, formats).tool().ok_or_else(|| {
        ReconError::UnrecognizedFormat {
            file: source.name.clone(),
        }
    })?;

    let entries = match tool {
        SourceTool::Baselight => BaselightParser.parse(&source.content),
        SourceTool::Flame => FlameParser::new(&formats.flame_markers).parse(&source.content),
    };

    let (identity, warning) = match identify(&source.name) {
        Ok(identity) => (Some(identity), None),
        Err(err) => (None, Some(err)),
    };

    log::debug!(
        "{}: {} export, {} entries",
        source.name,
        tool,
        entries.len()
    );

    Ok((
        ParsedSource {
            name: source.name.clone(),
            tool,
            identity,
            entries,
        },
        warning,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_baselight() {
        let content = "/baselightfilesystem1/Dune/reel1/partA/1920x1080 1001 1002\n";
        assert_eq!(classify(content, &FormatConfig::default()), Classification::Baselight);
    }

    #[test]
    fn classify_baselight_marker_below_mount() {
        let content = "/mnt/baselightfilesystem1/production/project_a/shot001.dpx 5 6\n";
        assert_eq!(classify(content, &FormatConfig::default()), Classification::Baselight);
    }

    #[test]
    fn classify_flame() {
        let content = "\n/net/flame-archive Dune/reel1/VFX/Hydraulx 1260 1261\n";
        assert_eq!(classify(content, &FormatConfig::default()), Classification::Flame);
    }

    #[test]
    fn classify_fails_closed() {
        let formats = FormatConfig::default();
        assert_eq!(classify("/home/me/shots 1 2 3\n", &formats), Classification::Unrecognized);
        assert_eq!(classify("", &formats), Classification::Unrecognized);
        assert_eq!(classify("Producer: Joe\n", &formats), Classification::Unrecognized);
        // Marker must be a whole leading token, not just a prefix of one.
        assert_eq!(classify("/net/flame-archived/x 1\n", &formats), Classification::Unrecognized);
    }

    #[test]
    fn parse_source_unrecognized() {
        let src = SourceFile::new("Notes_x_20240101.txt", "hello world\n");
        let err = parse_source(&src, &FormatConfig::default()).unwrap_err();
        assert!(matches!(err, ReconError::UnrecognizedFormat { .. }));
    }

    #[test]
    fn parse_source_unattributed_still_parses() {
        let src = SourceFile::new("export.txt", "/baselightfilesystem1/a/b 1 2 3\n");
        let (parsed, warning) = parse_source(&src, &FormatConfig::default()).unwrap();
        assert_eq!(parsed.tool, SourceTool::Baselight);
        assert!(parsed.identity.is_none());
        assert_eq!(parsed.entries.len(), 1);
        assert!(matches!(warning, Some(ReconError::UnidentifiedSource { .. })));
    }
}
