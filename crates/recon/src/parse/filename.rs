use std::path::Path;

use chrono::NaiveDate;

use crate::error::ReconError;
use crate::model::SourceIdentity;

/// Recover user and date from a `<tool>_<user>_<YYYYMMDD>.<ext>` name.
///
/// The user part may itself contain underscores; the tool label is everything
/// before the first one and the date everything after the last one. The tool
/// comes from the file's content, so the label only has to be present.
pub fn identify(name: &str) -> Result<SourceIdentity, ReconError> {
    let unidentified = || ReconError::UnidentifiedSource { file: name.to_string() };

    let path = Path::new(name);
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(unidentified)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(unidentified)?;

    let (tool, rest) = stem.split_once('_').ok_or_else(unidentified)?;
    let (user, date_str) = rest.rsplit_once('_').ok_or_else(unidentified)?;

    if tool.is_empty() || user.is_empty() {
        return Err(unidentified());
    }
    if date_str.len() != 8 || !date_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(unidentified());
    }
    let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").map_err(|_| unidentified())?;

    Ok(SourceIdentity {
        user: user.to_string(),
        date,
        filename: filename.to_string(),
    })
}
