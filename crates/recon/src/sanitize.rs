//! Frame token classification.
//!
//! Tool exports mix real frame numbers with placeholder markers such as
//! `<null>` and `<err>`. Anything that is not a plain non-negative integer
//! is dropped here and never reaches consolidation.

/// Markers emitted by grading tools in place of a frame number.
const SENTINELS: &[&str] = &["<null>", "<err>", "null", "err"];

/// One whitespace-separated field from an export line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameToken<'a> {
    pub raw: &'a str,
    pub value: Option<u64>,
}

impl<'a> FrameToken<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw, value: sanitize(raw) }
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    /// True for known placeholder markers (as opposed to arbitrary junk).
    pub fn is_sentinel(&self) -> bool {
        is_sentinel(self.raw)
    }
}

/// Parse a raw field as a frame number. Returns `None` for sentinels and
/// any non-numeric text; never fails.
pub fn sanitize(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_sentinel(trimmed) {
        return None;
    }
    // Only bare digits: rejects signs, decimals and exponents that
    // `str::parse` would otherwise accept (e.g. "+12").
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

pub fn is_sentinel(raw: &str) -> bool {
    let lower = raw.trim().to_ascii_lowercase();
    SENTINELS.contains(&lower.as_str())
}
