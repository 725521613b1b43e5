//! Frame ↔ timecode helpers for reviewing stored ranges against a clip.

use serde::Serialize;

use crate::consolidate::FrameRange;
use crate::error::ReconError;
use crate::model::ScriptRunRecord;

/// `HH:MM:SS:FF` for a frame number at `fps`. Seconds and the frame field
/// both come from the exact rate, so non-integer rates never repeat a
/// timecode.
pub fn frames_to_timecode(frame: u64, fps: f64) -> Result<String, ReconError> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(ReconError::InvalidFps(fps));
    }
    let total_seconds = frame as f64 / fps;
    let hours = (total_seconds / 3600.0).floor() as u64;
    let minutes = ((total_seconds % 3600.0) / 60.0).floor() as u64;
    let seconds = (total_seconds % 60.0).floor() as u64;
    let frames = (frame as f64 % fps).floor() as u64;
    Ok(format!("{hours:02}:{minutes:02}:{seconds:02}:{frames:02}"))
}

/// A stored range clipped to a clip's length, with review timecodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClippedRange {
    pub location: String,
    pub user: String,
    pub date: chrono::NaiveDate,
    pub original: String,
    pub start: u64,
    pub end: u64,
    pub middle: u64,
    pub start_timecode: String,
    pub end_timecode: String,
    pub middle_timecode: String,
}

/// Every stored range that overlaps `[1, total_frames]`, clamped to it.
pub fn ranges_within(
    runs: &[ScriptRunRecord],
    total_frames: u64,
    fps: f64,
) -> Result<Vec<ClippedRange>, ReconError> {
    let mut out = Vec::new();
    for run in runs {
        for row in &run.rows {
            for range in row.frames.ranges() {
                let Some(clipped) = range.clamp(total_frames) else {
                    continue;
                };
                out.push(clip(run, &row.location, range, clipped, fps)?);
            }
        }
    }
    Ok(out)
}

fn clip(
    run: &ScriptRunRecord,
    location: &str,
    original: &FrameRange,
    clipped: FrameRange,
    fps: f64,
) -> Result<ClippedRange, ReconError> {
    let middle = clipped.middle();
    Ok(ClippedRange {
        location: location.to_string(),
        user: run.user.clone(),
        date: run.date,
        original: original.to_string(),
        start: clipped.start,
        end: clipped.end,
        middle,
        start_timecode: frames_to_timecode(clipped.start, fps)?,
        end_timecode: frames_to_timecode(clipped.end, fps)?,
        middle_timecode: frames_to_timecode(middle, fps)?,
    })
}
