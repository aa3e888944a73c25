use anyhow::Result;
use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::Pid;
use std::fmt::Debug;
use std::fs::File;
use std::io::Write;
use std::mem;
use std::os::unix::io::FromRawFd;
use std::os::unix::io::RawFd;
use thiserror::Error;

/// Mini shell specific error types
///
/// Builtin and launch failures are reported through this taxonomy and never
/// terminate the interpreter itself.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("{0}: not found")]
    NotFound(String),

    #[error("{0}: permission denied")]
    PermissionDenied(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to create process: {0}")]
    ProcessCreationFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ShellResult<T> = std::result::Result<T, ShellError>;

/// Per-evaluation execution context handed to builtins and the pipeline
/// launcher. The `infile`/`outfile`/`errfile` descriptors are what the next
/// launched stage inherits; they are reset between command lines.
#[derive(Clone)]
pub struct Context {
    pub shell_pid: Pid,
    pub shell_pgid: Pid,
    pub foreground: bool,
    pub interactive: bool,
    pub infile: RawFd,
    pub outfile: RawFd,
    pub errfile: RawFd,
}

impl Context {
    pub fn new(shell_pid: Pid, shell_pgid: Pid, interactive: bool) -> Self {
        Context {
            shell_pid,
            shell_pgid,
            foreground: true,
            interactive,
            infile: STDIN_FILENO,
            outfile: STDOUT_FILENO,
            errfile: STDERR_FILENO,
        }
    }

    pub fn reset(&mut self) {
        self.foreground = true;
        self.infile = STDIN_FILENO;
        self.outfile = STDOUT_FILENO;
        self.errfile = STDERR_FILENO;
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        f.debug_struct("Context")
            .field("shell_pid", &self.shell_pid)
            .field("shell_pgid", &self.shell_pgid)
            .field("foreground", &self.foreground)
            .field("interactive", &self.interactive)
            .field("infile", &self.infile)
            .field("outfile", &self.outfile)
            .field("errfile", &self.errfile)
            .finish()
    }
}

impl Context {
    pub fn write_stdout(&self, msg: &str) -> Result<()> {
        let mut file = unsafe { File::from_raw_fd(self.outfile) };
        writeln!(&mut file, "{msg}")?;
        mem::forget(file);
        Ok(())
    }

    pub fn write_stderr(&self, msg: &str) -> Result<()> {
        let mut file = unsafe { File::from_raw_fd(self.errfile) };
        writeln!(&mut file, "{msg}")?;
        mem::forget(file);
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExitStatus {
    ExitedWith(i32),
    Running(Pid),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::getpid;

    #[test]
    fn context_defaults_to_standard_streams() {
        let pid = getpid();
        let mut ctx = Context::new(pid, pid, false);
        assert_eq!(ctx.infile, STDIN_FILENO);
        assert_eq!(ctx.outfile, STDOUT_FILENO);
        assert_eq!(ctx.errfile, STDERR_FILENO);
        assert!(ctx.foreground);

        ctx.foreground = false;
        ctx.outfile = 7;
        ctx.reset();
        assert!(ctx.foreground);
        assert_eq!(ctx.outfile, STDOUT_FILENO);
    }

    #[test]
    fn shell_error_messages() {
        assert_eq!(
            ShellError::NotFound("/tmp/nope".to_string()).to_string(),
            "/tmp/nope: not found"
        );
        assert_eq!(
            ShellError::InvalidArgument("bad mask".to_string()).to_string(),
            "invalid argument: bad mask"
        );
    }
}
