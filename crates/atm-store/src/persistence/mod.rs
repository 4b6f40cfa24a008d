//! On-disk persistence: a canonical primary store plus a write-only report
//! view (`§4.6`).
//!
//! Two sibling directories relative to the process's working directory,
//! created with `0o777` permissions if missing (`§6`). The report store
//! (`filez/`) is never read back — `§9`'s design note treats it as a view
//! computed on demand from the canonical primary store (`dataz/`), not an
//! alternate source of truth.

pub mod primary;
pub mod report;

use std::path::{Path, PathBuf};

use crate::error::{PersistenceError, Result};

pub const PRIMARY_DIR: &str = "dataz";
pub const REPORT_DIR: &str = "filez";

/// Ensure `dir` exists, with `0o777` permissions on Unix (`§6`). A no-op on
/// non-Unix targets beyond creating the directory, since that permission
/// bit has no equivalent there.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| PersistenceError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o777)).map_err(|e| {
            PersistenceError::Io {
                path: dir.display().to_string(),
                source: e,
            }
        })?;
    }
    Ok(())
}

pub fn primary_dir(root: &Path) -> PathBuf {
    root.join(PRIMARY_DIR)
}

pub fn report_dir(root: &Path) -> PathBuf {
    root.join(REPORT_DIR)
}

pub fn account_file(dir: &Path, account_id: u64) -> PathBuf {
    dir.join(format!("{account_id}.csv"))
}
