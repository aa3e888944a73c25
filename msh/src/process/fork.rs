use msh_types::ShellError;
use nix::unistd::{ForkResult, Pid, fork, getpid};
use std::os::unix::io::RawFd;
use tracing::{debug, error};

use super::io::close_fd;
use super::process::Process;

/// Fork one pipeline stage. The child closes every pipe and redirection
/// descriptor that is not wired to its own standard streams, then execs;
/// the parent only records the pid.
pub(crate) fn fork_stage(
    process: &mut Process,
    job_pgid: Option<Pid>,
    pipes: &[(RawFd, RawFd)],
    redirect_fds: &[RawFd],
) -> Result<Pid, ShellError> {
    let fork_result =
        unsafe { fork() }.map_err(|e| ShellError::ProcessCreationFailed(e.to_string()))?;

    match fork_result {
        ForkResult::Parent { child } => {
            debug!("forked {} pid:{}", process.cmd, child);
            Ok(child)
        }
        ForkResult::Child => {
            let pid = getpid();
            let pgid = job_pgid.unwrap_or(pid);

            for (read_end, write_end) in pipes {
                if *read_end != process.stdin {
                    close_fd(*read_end);
                }
                if *write_end != process.stdout {
                    close_fd(*write_end);
                }
            }
            for fd in redirect_fds {
                if *fd != process.stdin && *fd != process.stdout && *fd != process.stderr {
                    close_fd(*fd);
                }
            }

            if let Err(err) = process.launch(pid, pgid) {
                error!("failed to launch child process: {err}");
                std::process::exit(1);
            }
            // execv replaces the image on success and exits the child on
            // failure; this point is never reached.
            std::process::exit(1);
        }
    }
}
