use std::io::Read;
use std::path::Path;

use framefix_recon::error::ReconError;
use framefix_recon::model::SourceFile;

/// Read a file and convert to UTF-8 if needed. Exports saved on Windows
/// workstations are often Windows-1252.
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let unreadable = |e: std::io::Error| ReconError::UnreadableFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut file = std::fs::File::open(path).map_err(unreadable)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(unreadable)?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Load an export for the engine. The source keeps the full path as its
/// name; attribution only looks at the basename.
pub fn load_source(path: &Path) -> Result<SourceFile, ReconError> {
    let content = read_file_as_utf8(path)?;
    Ok(SourceFile::new(path.display().to_string(), content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Baselight_a_20230323.txt");
        fs::write(&path, "/baselightfilesystem1/x 1 2\n").unwrap();
        let source = load_source(&path).unwrap();
        assert_eq!(source.content, "/baselightfilesystem1/x 1 2\n");
        assert!(source.name.ends_with("Baselight_a_20230323.txt"));
    }

    #[test]
    fn falls_back_to_windows_1252() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Xytech_20230323.txt");
        // "Producer: José" with 0xE9 for é
        let mut bytes = b"Producer: Jos".to_vec();
        bytes.push(0xE9);
        fs::write(&path, &bytes).unwrap();
        assert_eq!(read_file_as_utf8(&path).unwrap(), "Producer: José");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let err = read_file_as_utf8(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, ReconError::UnreadableFile { .. }));
    }
}
