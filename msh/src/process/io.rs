use anyhow::Result;
use nix::unistd::{close, dup2};
use std::os::unix::io::RawFd;
use tracing::warn;

/// Duplicate `src` onto `dst` and drop the original descriptor.
pub(crate) fn copy_fd(src: RawFd, dst: RawFd) -> Result<()> {
    if src != dst {
        dup2(src, dst).map_err(|e| anyhow::anyhow!("dup2 failed: {e}"))?;
        close(src).map_err(|e| anyhow::anyhow!("close failed: {e}"))?;
    }
    Ok(())
}

/// Close a descriptor this process no longer needs. Best effort; pipe ends
/// must go away promptly or downstream readers never see end-of-file.
pub(crate) fn close_fd(fd: RawFd) {
    if let Err(err) = close(fd) {
        warn!("failed to close fd {}: {}", fd, err);
    }
}
