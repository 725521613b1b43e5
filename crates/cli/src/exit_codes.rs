//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, unconfirmed destructive op)   |
//! | 3    | Partial run: some inputs failed, output still written |
//! | 4    | Invalid config                                       |
//! | 5    | Record store error                                   |
//! | 6    | I/O error (missing or unreadable input, write error) |

use framefix_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing `--yes` on `clear`.
/// clap uses the same code for argument errors.
pub const EXIT_USAGE: u8 = 2;

/// At least one input failed (unrecognized format, missing or unreadable
/// file) but the run completed with the rest.
pub const EXIT_PARTIAL: u8 = 3;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// SQLite store could not be opened, read or written.
pub const EXIT_STORE: u8 = 5;

/// Input could not be found or read, or output could not be written.
pub const EXIT_IO: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Store(_) => EXIT_STORE,
        ReconError::MissingInput { .. } | ReconError::UnreadableFile { .. } | ReconError::Io { .. } => EXIT_IO,
        ReconError::InvalidFps(_) => EXIT_USAGE,
        ReconError::UnrecognizedFormat { .. }
        | ReconError::UnidentifiedSource { .. }
        | ReconError::RangeParse(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_PARTIAL,
            EXIT_INVALID_CONFIG,
            EXIT_STORE,
            EXIT_IO,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn engine_errors_map() {
        assert_eq!(recon_exit_code(&ReconError::ConfigValidation("x".into())), EXIT_INVALID_CONFIG);
        assert_eq!(recon_exit_code(&ReconError::Store("x".into())), EXIT_STORE);
        assert_eq!(recon_exit_code(&ReconError::MissingInput { path: "x".into() }), EXIT_IO);
        assert_eq!(
            recon_exit_code(&ReconError::Io { path: "out.csv".into(), reason: "denied".into() }),
            EXIT_IO
        );
    }
}
