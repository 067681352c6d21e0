//! Run directory housekeeping and publish-time file moves.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// `EXDEV` on Linux and macOS.
const EXDEV: i32 = 18;

/// Move `src` to `dst`, replacing any existing file and creating the
/// destination directory. Falls back to copying when the two paths live on
/// different filesystems.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Err(e) if e.raw_os_error() == Some(EXDEV) => {
            debug!(src = %src.display(), dst = %dst.display(), "Rename crosses devices, copying");
            copy_across(src, dst).await
        }
        other => other.map_err(MediaError::from),
    }
}

/// Copy into a sibling of `dst`, rename it into place, then drop `src`.
/// A reader of `dst` never sees a partial file.
async fn copy_across(src: &Path, dst: &Path) -> MediaResult<()> {
    let staging = staging_path(dst);
    if let Err(e) = stage_and_rename(src, &staging, dst).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        warn!(src = %src.display(), error = %e, "Moved file but could not remove the original");
    }
    Ok(())
}

async fn stage_and_rename(src: &Path, staging: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, staging).await?;
    fs::rename(staging, dst).await
}

fn staging_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dst.with_file_name(name)
}

/// Recursively remove a directory. A missing directory is not an error.
///
/// Returns whether anything was removed.
pub async fn remove_dir_if_exists(path: impl AsRef<Path>) -> MediaResult<bool> {
    match fs::remove_dir_all(path.as_ref()).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MediaError::from(e)),
    }
}
