use msh_types::{ShellError, ShellResult};
use nix::errno::Errno;
use nix::fcntl::{OFlag, open};
use nix::sys::stat::Mode;
use std::os::unix::io::RawFd;
use tracing::debug;

use super::io::close_fd;

/// Requested file redirections for one pipeline. Input applies to the
/// first stage, output and error to the last stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirect {
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl Redirect {
    /// Open every requested target exactly once, before any fork. Nothing
    /// is substituted on failure: the caller gets the typed error and no
    /// descriptor leaks.
    pub(crate) fn resolve(&self) -> ShellResult<ResolvedRedirect> {
        let stdin = match &self.stdin {
            Some(path) => Some(open_input(path)?),
            None => None,
        };
        let stdout = match &self.stdout {
            Some(path) => match create_target(path) {
                Ok(fd) => Some(fd),
                Err(err) => {
                    if let Some(fd) = stdin {
                        close_fd(fd);
                    }
                    return Err(err);
                }
            },
            None => None,
        };
        let stderr = match &self.stderr {
            Some(path) => match create_target(path) {
                Ok(fd) => Some(fd),
                Err(err) => {
                    if let Some(fd) = stdin {
                        close_fd(fd);
                    }
                    if let Some(fd) = stdout {
                        close_fd(fd);
                    }
                    return Err(err);
                }
            },
            None => None,
        };
        debug!(
            "resolved redirect {:?} -> in:{:?} out:{:?} err:{:?}",
            self, stdin, stdout, stderr
        );
        Ok(ResolvedRedirect {
            stdin,
            stdout,
            stderr,
        })
    }
}

fn open_input(path: &str) -> ShellResult<RawFd> {
    open(path, OFlag::O_RDONLY, Mode::empty()).map_err(|errno| match errno {
        Errno::ENOENT => ShellError::NotFound(path.to_string()),
        Errno::EACCES => ShellError::PermissionDenied(path.to_string()),
        errno => ShellError::Io(std::io::Error::from_raw_os_error(errno as i32)),
    })
}

// Create/truncate with the full rw mode; the kernel subtracts the process
// umask, which the umask builtin controls.
fn create_target(path: &str) -> ShellResult<RawFd> {
    let flags = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC;
    open(path, flags, Mode::from_bits_truncate(0o666)).map_err(|errno| match errno {
        Errno::EACCES => ShellError::PermissionDenied(path.to_string()),
        Errno::ENOENT => ShellError::NotFound(path.to_string()),
        errno => ShellError::Io(std::io::Error::from_raw_os_error(errno as i32)),
    })
}

/// The opened descriptors for one pipeline launch. Owned by the launcher:
/// children duplicate what they need, the parent closes everything.
#[derive(Debug, Default)]
pub(crate) struct ResolvedRedirect {
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
    pub stderr: Option<RawFd>,
}

impl ResolvedRedirect {
    pub(crate) fn fds(&self) -> Vec<RawFd> {
        [self.stdin, self.stdout, self.stderr]
            .into_iter()
            .flatten()
            .collect()
    }

    pub(crate) fn close_all(&mut self) {
        for fd in [self.stdin.take(), self.stdout.take(), self.stderr.take()]
            .into_iter()
            .flatten()
        {
            close_fd(fd);
        }
    }
}
