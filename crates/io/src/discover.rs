//! Input discovery: bare file names are looked up in the usual drop
//! locations before giving up.

use std::path::{Path, PathBuf};

use framefix_recon::error::ReconError;

/// Project-relative directories searched, in order, after the name itself.
pub const LOCAL_DIRS: [&str; 5] = [".", "input", "input/baselight", "input/flame", "input/xytech"];

/// Ordered directories to search for `name`, relative to `base`.
pub fn search_dirs(base: &Path) -> Vec<PathBuf> {
    let mut dirs_out: Vec<PathBuf> = LOCAL_DIRS.iter().map(|d| base.join(d)).collect();
    dirs_out.extend(
        [dirs::download_dir(), dirs::desktop_dir(), dirs::document_dir()]
            .into_iter()
            .flatten(),
    );
    dirs_out
}

/// Resolve `name` to an existing file. An existing path wins outright.
pub fn find_input(name: &str) -> Result<PathBuf, ReconError> {
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_input_in(name, &search_dirs(&base))
}

/// [`find_input`] over an explicit directory list.
pub fn find_input_in(name: &str, dirs_in: &[PathBuf]) -> Result<PathBuf, ReconError> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Ok(direct);
    }

    // Only plain names get searched; a path with directories was meant literally.
    let file_name = Path::new(name).file_name();
    if file_name.is_some_and(|f| f == name) {
        for dir in dirs_in {
            let candidate = dir.join(name);
            if candidate.is_file() {
                log::debug!("found {name} in {}", dir.display());
                return Ok(candidate);
            }
        }
    }

    Err(ReconError::MissingInput { path: name.to_string() })
}

/// Locate the work order for a date (`Xytech_<YYYYMMDD>.txt`).
pub fn find_work_order(date: chrono::NaiveDate) -> Option<PathBuf> {
    find_input(&format!("Xytech_{}.txt", date.format("%Y%m%d"))).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_in_search_dirs_in_order() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("input");
        let second = dir.path().join("input/flame");
        fs::create_dir_all(&second).unwrap();
        fs::write(second.join("Flame_a_20230323.txt"), "x").unwrap();

        let found = find_input_in("Flame_a_20230323.txt", &[first.clone(), second.clone()]).unwrap();
        assert_eq!(found, second.join("Flame_a_20230323.txt"));

        fs::write(first.join("Flame_a_20230323.txt"), "y").unwrap();
        let found = find_input_in("Flame_a_20230323.txt", &[first.clone(), second]).unwrap();
        assert_eq!(found, first.join("Flame_a_20230323.txt"));
    }

    #[test]
    fn existing_path_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Baselight_a_20230323.txt");
        fs::write(&path, "x").unwrap();
        let name = path.display().to_string();
        assert_eq!(find_input_in(&name, &[]).unwrap(), path);
    }

    #[test]
    fn missing_input() {
        let dir = tempdir().unwrap();
        let err = find_input_in("Xytech_20990101.txt", &[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, ReconError::MissingInput { ref path } if path == "Xytech_20990101.txt"));
    }

    #[test]
    fn search_order_starts_local() {
        let dirs_out = search_dirs(Path::new("/work"));
        assert_eq!(dirs_out[0], PathBuf::from("/work/."));
        assert_eq!(dirs_out[4], PathBuf::from("/work/input/xytech"));
    }
}
