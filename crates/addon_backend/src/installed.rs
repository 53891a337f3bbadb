use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("addon directory '{}' does not exist", .path.display())]
    Missing { path: PathBuf },
    #[error("failed to read addon directory '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "addon_dir_missing",
            Self::Read { .. } => "io",
        }
    }
}

/// Counts addon folders directly under `addon_dir`. Hidden entries and plain
/// files are skipped; a folder without a manifest still counts.
pub async fn count_installed_addons(addon_dir: &Path) -> Result<u64, ScanError> {
    let read_err = |source: io::Error| ScanError::Read {
        path: addon_dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(addon_dir).await.map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ScanError::Missing {
                path: addon_dir.to_path_buf(),
            }
        } else {
            read_err(source)
        }
    })?;

    let mut count = 0;
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().await.map_err(read_err)?;
        let is_dir = if file_type.is_symlink() {
            tokio::fs::metadata(entry.path())
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false)
        } else {
            file_type.is_dir()
        };
        if is_dir {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
#[path = "tests/installed_tests.rs"]
mod tests;
