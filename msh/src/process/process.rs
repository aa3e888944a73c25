use anyhow::{Context as _, Result};
use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::unistd::{Pid, close, dup2, execv, setpgid};
use std::ffi::CString;
use std::os::unix::io::RawFd;
use tracing::debug;

use super::io::copy_fd;
use super::state::ProcessState;
use super::wait::wait_pid_job;

/// One external pipeline stage: the resolved program path, its argv, and
/// once forked the child pid and last observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub cmd: String,
    pub argv: Vec<String>,
    pub(crate) pid: Option<Pid>,
    pub(crate) state: ProcessState,
    pub stdin: RawFd,
    pub stdout: RawFd,
    pub stderr: RawFd,
}

impl Process {
    pub fn new(cmd: String, argv: Vec<String>) -> Self {
        Process {
            cmd,
            argv,
            pid: None,
            state: ProcessState::Running,
            stdin: STDIN_FILENO,
            stdout: STDOUT_FILENO,
            stderr: STDERR_FILENO,
        }
    }

    fn set_signals(&self) -> Result<()> {
        // Accept job-control-related signals again (refer https://www.gnu.org/software/libc/manual/html_node/Launching-Jobs.html)
        let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        for signal in [
            Signal::SIGINT,
            Signal::SIGQUIT,
            Signal::SIGTSTP,
            Signal::SIGTTIN,
            Signal::SIGTTOU,
            Signal::SIGCHLD,
        ] {
            unsafe {
                sigaction(signal, &action)
                    .map_err(|e| anyhow::anyhow!("failed to reset {signal} handler: {e}"))?;
            }
        }
        Ok(())
    }

    /// Child-side launch: join the pipeline's process group, restore signal
    /// dispositions, wire the standard streams, exec. On success the call
    /// never returns; on failure the child reports to its inherited stderr
    /// and exits without touching the parent's control flow.
    pub(crate) fn launch(&mut self, pid: Pid, pgid: Pid) -> Result<()> {
        setpgid(pid, pgid).context("failed setpgid")?;
        self.set_signals()?;

        let cmd = CString::new(self.cmd.clone()).context("failed new CString")?;
        let argv: Result<Vec<CString>> = self
            .argv
            .clone()
            .into_iter()
            .map(|a| CString::new(a).map_err(|e| anyhow::anyhow!("failed to create CString: {e}")))
            .collect();
        let argv = argv?;

        debug!(
            "launch: execv cmd:{:?} argv:{:?} stdin:{} stdout:{} stderr:{} pid:{} pgid:{}",
            cmd, argv, self.stdin, self.stdout, self.stderr, pid, pgid,
        );

        copy_fd(self.stdin, STDIN_FILENO)?;
        if self.stdout == self.stderr {
            dup2(self.stdout, STDOUT_FILENO)
                .map_err(|e| anyhow::anyhow!("dup2 stdout failed: {e}"))?;
            dup2(self.stderr, STDERR_FILENO)
                .map_err(|e| anyhow::anyhow!("dup2 stderr failed: {e}"))?;
            close(self.stdout).map_err(|e| anyhow::anyhow!("close stdout failed: {e}"))?;
        } else {
            copy_fd(self.stdout, STDOUT_FILENO)?;
            copy_fd(self.stderr, STDERR_FILENO)?;
        }
        match execv(&cmd, &argv) {
            Ok(_) => Ok(()),
            Err(nix::errno::Errno::EACCES) => {
                eprintln!("msh: {}: permission denied", self.cmd);
                std::process::exit(126);
            }
            Err(err) => {
                eprintln!("msh: {}: {}", self.cmd, err);
                std::process::exit(127);
            }
        }
    }

    /// Parent-side non-blocking poll used by the reaper.
    pub(crate) fn update_state(&mut self) {
        if self.state.is_completed() {
            return;
        }
        if let Some(pid) = self.pid
            && let Some((_waited_pid, state)) = wait_pid_job(pid, true)
        {
            self.state = state;
        }
    }
}
