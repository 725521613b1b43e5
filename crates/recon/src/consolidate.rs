//! Frame range consolidation.
//!
//! Collapses a set of frame numbers into maximal contiguous runs and renders
//! them as `1001-1003,2001-2002,2004`. The inverse (`expand`) and a parser
//! for the rendered form are used when merging historical records back
//! together.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ReconError;

/// Rendering used for [`ConsolidatedRange::NoData`] when no marker is configured.
pub const NO_FRAMES_MARKER: &str = "No frames to fix";

/// Inclusive run of consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRange {
    pub start: u64,
    pub end: u64,
}

impl FrameRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn single(frame: u64) -> Self {
        Self { start: frame, end: frame }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    pub fn frames(&self) -> impl Iterator<Item = u64> {
        self.start..=self.end
    }

    /// Middle frame, rounded down.
    pub fn middle(&self) -> u64 {
        self.start + (self.end - self.start) / 2
    }

    /// Intersect with `[1, total_frames]`. `None` if nothing overlaps.
    pub fn clamp(&self, total_frames: u64) -> Option<FrameRange> {
        if total_frames == 0 || self.start > total_frames || self.end < 1 {
            return None;
        }
        Some(FrameRange {
            start: self.start.max(1),
            end: self.end.min(total_frames),
        })
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for FrameRange {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ReconError::RangeParse(s.to_string());
        match s.split_once('-') {
            Some((a, b)) => {
                let start: u64 = a.trim().parse().map_err(|_| err())?;
                let end: u64 = b.trim().parse().map_err(|_| err())?;
                if start > end {
                    return Err(err());
                }
                Ok(FrameRange { start, end })
            }
            None => s.parse().map(FrameRange::single).map_err(|_| err()),
        }
    }
}

/// Consolidated frames for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsolidatedRange {
    /// Location is known but has no valid frames.
    NoData,
    /// Non-empty, ascending, maximal, non-overlapping runs.
    Ranges(Vec<FrameRange>),
}

impl ConsolidatedRange {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    pub fn ranges(&self) -> &[FrameRange] {
        match self {
            Self::NoData => &[],
            Self::Ranges(r) => r,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.ranges().iter().map(FrameRange::len).sum()
    }

    /// Comma-joined ranges, or `no_data` for [`ConsolidatedRange::NoData`].
    pub fn render(&self, no_data: &str) -> String {
        match self {
            Self::NoData => no_data.to_string(),
            Self::Ranges(ranges) => ranges
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Parse a rendered range list. The empty string and the default marker
    /// both mean no data.
    pub fn parse(s: &str) -> Result<Self, ReconError> {
        let s = s.trim();
        if s.is_empty() || s == NO_FRAMES_MARKER {
            return Ok(Self::NoData);
        }
        let mut frames = BTreeSet::new();
        for part in s.split(',') {
            let range: FrameRange = part.parse()?;
            frames.extend(range.frames());
        }
        Ok(consolidate(&frames))
    }
}

impl fmt::Display for ConsolidatedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(NO_FRAMES_MARKER))
    }
}

impl Serialize for ConsolidatedRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NoData => serializer.serialize_none(),
            Self::Ranges(_) => serializer.serialize_str(&self.render("")),
        }
    }
}

/// Collapse unique frame numbers into maximal ascending runs.
pub fn consolidate(frames: &BTreeSet<u64>) -> ConsolidatedRange {
    let mut iter = frames.iter().copied();
    let Some(first) = iter.next() else {
        return ConsolidatedRange::NoData;
    };

    let mut ranges = Vec::new();
    let mut current = FrameRange::single(first);
    for frame in iter {
        if frame == current.end + 1 {
            current.end = frame;
        } else {
            ranges.push(current);
            current = FrameRange::single(frame);
        }
    }
    ranges.push(current);

    ConsolidatedRange::Ranges(ranges)
}

/// Consolidate from an unordered slice that may contain duplicates.
pub fn consolidate_unsorted(frames: &[u64]) -> ConsolidatedRange {
    let set: BTreeSet<u64> = frames.iter().copied().collect();
    consolidate(&set)
}

/// Re-expand consolidated ranges into the underlying frame set.
pub fn expand(range: &ConsolidatedRange) -> BTreeSet<u64> {
    range.ranges().iter().flat_map(FrameRange::frames).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(frames: &[u64]) -> BTreeSet<u64> {
        frames.iter().copied().collect()
    }

    #[test]
    fn single_run() {
        assert_eq!(consolidate(&set(&[1001, 1002, 1003])).to_string(), "1001-1003");
    }

    #[test]
    fn run_then_single() {
        assert_eq!(consolidate(&set(&[2001, 2002, 2004])).to_string(), "2001-2002,2004");
    }

    #[test]
    fn empty_is_no_data() {
        let r = consolidate(&BTreeSet::new());
        assert!(r.is_no_data());
        assert_eq!(r.render("-"), "-");
        assert_eq!(r.to_string(), NO_FRAMES_MARKER);
    }

    #[test]
    fn unsorted_with_duplicates() {
        let r = consolidate_unsorted(&[5, 3, 4, 4, 10, 1, 3]);
        assert_eq!(r.to_string(), "1,3-5,10");
        assert_eq!(r.frame_count(), 5);
    }

    #[test]
    fn parse_rendered() {
        let r = ConsolidatedRange::parse("1001-1003, 2004").unwrap();
        assert_eq!(r.ranges(), &[FrameRange::new(1001, 1003), FrameRange::single(2004)]);
        // Overlapping and adjacent input re-merges.
        let r = ConsolidatedRange::parse("1-3,4,3-6").unwrap();
        assert_eq!(r.to_string(), "1-6");
        assert!(ConsolidatedRange::parse("").unwrap().is_no_data());
        assert!(ConsolidatedRange::parse(NO_FRAMES_MARKER).unwrap().is_no_data());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ConsolidatedRange::parse("12-a").is_err());
        assert!(ConsolidatedRange::parse("9-3").is_err());
        assert!("x".parse::<FrameRange>().is_err());
    }

    #[test]
    fn clamp_to_bounds() {
        let r = FrameRange::new(0, 50);
        assert_eq!((&r).clamp(20), Some(FrameRange::new(1, 20)));
        assert_eq!((&FrameRange::new(30, 40)).clamp(20), None);
        assert_eq!((&FrameRange::new(5, 9)).clamp(0), None);
        assert_eq!(FrameRange::new(5, 9).middle(), 7);
    }

    #[test]
    fn serializes_as_string_or_null() {
        let r = consolidate(&set(&[1, 2, 7]));
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"1-2,7\"");
        assert_eq!(serde_json::to_string(&ConsolidatedRange::NoData).unwrap(), "null");
    }
}
