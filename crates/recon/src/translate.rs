//! Local path → facility path translation.
//!
//! Workstation mount points differ, but the subtree below an anchor keyword
//! (e.g. `production`) is stable. Translation keeps that subtree and
//! re-roots it under the facility storage root. Paths without an anchor
//! pass through unchanged.

use crate::config::TranslationConfig;
use crate::model::CanonicalLocation;

#[derive(Debug, Clone)]
pub struct PathTranslator {
    anchors: Vec<String>,
    facility_root: String,
}

impl PathTranslator {
    pub fn new(anchors: Vec<String>, facility_root: impl Into<String>) -> Self {
        let root: String = facility_root.into();
        Self {
            anchors,
            facility_root: normalize(&root),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.anchors.clone(), config.facility_root.clone())
    }

    /// Translate a local path. Total: unanchored paths come back normalized
    /// but otherwise unchanged.
    pub fn translate(&self, local_path: &str) -> String {
        let normalized = normalize(local_path);
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

        for anchor in &self.anchors {
            if let Some(pos) = segments.iter().position(|s| *s == anchor.as_str()) {
                let tail = segments[pos..].join("/");
                return if self.facility_root == "/" {
                    format!("/{tail}")
                } else {
                    format!("{}/{tail}", self.facility_root)
                };
            }
        }

        log::debug!("no anchor in '{local_path}', passing through");
        normalized
    }

    pub fn canonicalize(&self, local_path: &str) -> CanonicalLocation {
        CanonicalLocation {
            path: self.translate(local_path),
            local_path: local_path.to_string(),
        }
    }
}

/// Collapse repeated `/` and drop a trailing one (except for the root).
fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut prev_slash = false;
    for ch in trimmed.chars() {
        if ch == '/' {
            if !prev_slash {
                out.push(ch);
            }
            prev_slash = true;
        } else {
            out.push(ch);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}
