use serde::Deserialize;

use crate::consolidate::NO_FRAMES_MARKER;
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine configuration. Every section has defaults, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FramefixConfig {
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub formats: FormatConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// Anchor keywords mark where the facility-relevant subtree of a local path
/// begins. Anchors are tried in order; the first one present wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationConfig {
    #[serde(default = "default_anchors")]
    pub anchors: Vec<String>,
    #[serde(default = "default_facility_root")]
    pub facility_root: String,
}

fn default_anchors() -> Vec<String> {
    vec!["production".into()]
}

fn default_facility_root() -> String {
    "/facility/storage".into()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            anchors: default_anchors(),
            facility_root: default_facility_root(),
        }
    }
}

// ---------------------------------------------------------------------------
// Format markers
// ---------------------------------------------------------------------------

/// Root markers used to tell exports apart by content.
///
/// `baselight_markers` match as a prefix of the first path segment
/// (`baselightfilesystem` matches `/baselightfilesystem1/...`).
/// `flame_markers` match the whole leading token (`/net/flame-archive`),
/// optionally followed by more path.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    #[serde(default = "default_baselight_markers")]
    pub baselight_markers: Vec<String>,
    #[serde(default = "default_flame_markers")]
    pub flame_markers: Vec<String>,
}

fn default_baselight_markers() -> Vec<String> {
    vec!["baselightfilesystem".into()]
}

fn default_flame_markers() -> Vec<String> {
    vec!["/net/flame-archive".into()]
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            baselight_markers: default_baselight_markers(),
            flame_markers: default_flame_markers(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// One row per location, ranges comma-joined.
    #[default]
    PerLocation,
    /// One row per range, location repeated.
    PerRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_no_frames_marker")]
    pub no_frames_marker: String,
    #[serde(default)]
    pub layout: ReportLayout,
}

fn default_no_frames_marker() -> String {
    NO_FRAMES_MARKER.into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            no_frames_marker: default_no_frames_marker(),
            layout: ReportLayout::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl FramefixConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: FramefixConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let t = &self.translation;
        if t.anchors.is_empty() {
            return Err(ReconError::ConfigValidation(
                "translation.anchors must list at least one keyword".into(),
            ));
        }
        for anchor in &t.anchors {
            if anchor.is_empty() || anchor.contains('/') {
                return Err(ReconError::ConfigValidation(format!(
                    "anchor '{anchor}' must be a single non-empty path segment"
                )));
            }
        }
        if !t.facility_root.starts_with('/') {
            return Err(ReconError::ConfigValidation(format!(
                "facility_root must be absolute, got '{}'",
                t.facility_root
            )));
        }

        let f = &self.formats;
        if f.baselight_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(
                "formats.baselight_markers must not be empty".into(),
            ));
        }
        if f.flame_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(
                "formats.flame_markers must not be empty".into(),
            ));
        }

        if self.report.no_frames_marker.is_empty() {
            return Err(ReconError::ConfigValidation(
                "report.no_frames_marker must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = FramefixConfig::from_toml("").unwrap();
        assert_eq!(config.translation.anchors, vec!["production"]);
        assert_eq!(config.translation.facility_root, "/facility/storage");
        assert_eq!(config.formats.flame_markers, vec!["/net/flame-archive"]);
        assert_eq!(config.report.no_frames_marker, NO_FRAMES_MARKER);
        assert_eq!(config.report.layout, ReportLayout::PerLocation);
    }

    #[test]
    fn parse_full() {
        let input = r#"
[translation]
anchors = ["Avatar", "production"]
facility_root = "/hpsans13/production"

[formats]
baselight_markers = ["baselightfilesystem", "images"]
flame_markers = ["/net/flame-archive"]

[report]
no_frames_marker = "n/a"
layout = "per_range"
"#;
        let config = FramefixConfig::from_toml(input).unwrap();
        assert_eq!(config.translation.anchors, vec!["Avatar", "production"]);
        assert_eq!(config.formats.baselight_markers.len(), 2);
        assert_eq!(config.report.no_frames_marker, "n/a");
        assert_eq!(config.report.layout, ReportLayout::PerRange);
    }

    #[test]
    fn reject_relative_root() {
        let err = FramefixConfig::from_toml("[translation]\nfacility_root = \"facility\"\n").unwrap_err();
        assert!(err.to_string().contains("must be absolute"));
    }

    #[test]
    fn reject_anchor_with_slash() {
        let err = FramefixConfig::from_toml("[translation]\nanchors = [\"a/b\"]\n").unwrap_err();
        assert!(err.to_string().contains("'a/b'"));
    }

    #[test]
    fn reject_empty_anchor_list() {
        let err = FramefixConfig::from_toml("[translation]\nanchors = []\n").unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn reject_unknown_layout() {
        let err = FramefixConfig::from_toml("[report]\nlayout = \"sideways\"\n");
        assert!(err.is_err(), "typo in layout should fail deserialization");
    }

    #[test]
    fn reject_unknown_section_key() {
        let err = FramefixConfig::from_toml("[translation]\nanchor = \"production\"\n");
        assert!(err.is_err());
    }
}
