pub mod eval;
pub mod job;

use crate::environment::Environment;
use crate::process::Job;
use crate::process::signal::install_sigint_handler;
use crate::process::state::ProcessState;
use anyhow::Result;
use msh_builtin::ShellProxy;
use msh_types::{Context, ExitStatus, ShellError};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{Pid, getpid};
use std::path::Path;
use tracing::{debug, warn};

pub const APP_NAME: &str = "msh";

/// Default file creation mask applied at startup.
pub const DEFAULT_UMASK: u32 = 0o022;

/// One interactive session: the job table, the foreground slot, the umask
/// and the immutable environment snapshot. Passed explicitly to every
/// component; the only process-wide global is the signal flag.
pub struct Shell {
    pub environment: Environment,
    pub exited: Option<ExitStatus>,
    pub pid: Pid,
    pub pgid: Pid,
    pub(crate) wait_jobs: Vec<Job>,
    pub(crate) next_job_id: usize,
    pub(crate) foreground: Option<Pid>,
    umask_value: u32,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("pid", &self.pid)
            .field("pgid", &self.pgid)
            .field("jobs", &self.wait_jobs.len())
            .finish()
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        let _ = self.kill_wait_jobs();
    }
}

impl Shell {
    pub fn new(environment: Environment) -> Self {
        let pid = getpid();
        let pgid = pid;
        umask(Mode::from_bits_truncate(DEFAULT_UMASK));

        Shell {
            environment,
            exited: None,
            pid,
            pgid,
            wait_jobs: Vec::new(),
            next_job_id: 1,
            foreground: None,
            umask_value: DEFAULT_UMASK,
        }
    }

    pub fn set_signals(&mut self) {
        if let Err(e) = install_sigint_handler() {
            warn!("failed to install SIGINT handler: {e}");
        }

        // The interpreter itself ignores the remaining job-control signals
        let action = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        for signal in [
            Signal::SIGQUIT,
            Signal::SIGTSTP,
            Signal::SIGTTIN,
            Signal::SIGTTOU,
        ] {
            unsafe {
                if let Err(e) = sigaction(signal, &action) {
                    warn!("failed to ignore {signal}: {e}");
                }
            }
        }
        debug!("signal handlers installed");
    }

    pub fn eval_str(&mut self, ctx: &mut Context, input: String) -> Result<i32> {
        eval::eval_str(self, ctx, input)
    }

    /// Terminate tracked background jobs, release the table and mark the
    /// session as finished. Only `exit` (or end-of-input) gets here.
    pub fn exit(&mut self) {
        if let Err(err) = self.terminate_background_jobs() {
            warn!("failed to terminate background jobs: {err}");
        }
        self.wait_jobs.clear();
        self.exited = Some(ExitStatus::ExitedWith(0));
    }

    pub fn get_next_job_id(&mut self) -> usize {
        job::get_next_job_id(self)
    }

    /// Register a background (or stopped) job and hand out its table id.
    pub fn insert_job(&mut self, mut job: Job) -> usize {
        let job_id = self.get_next_job_id();
        job.job_id = job_id;
        debug!("insert job [{}] {}", job_id, job.cmd);
        self.wait_jobs.push(job);
        job_id
    }

    /// Reap pass: retire and return every job whose processes have exited.
    pub fn check_job_state(&mut self) -> Vec<Job> {
        job::check_job_state(self)
    }

    pub fn kill_wait_jobs(&mut self) -> Result<()> {
        job::kill_wait_jobs(self)
    }

    pub fn terminate_background_jobs(&mut self) -> Result<()> {
        job::terminate_background_jobs(self)
    }

    pub(crate) fn record_background_state(&mut self, pid: Pid, state: ProcessState) {
        job::record_background_state(self, pid, state)
    }
}

impl ShellProxy for Shell {
    fn exit_shell(&mut self) {
        self.exit();
    }

    fn dispatch(&mut self, ctx: &Context, cmd: &str, argv: Vec<String>) -> Result<()> {
        match cmd {
            "jobs" => job::run_jobs(self, ctx),
            "fg" => job::run_fg(self, ctx, argv),
            _ => Ok(()),
        }
    }

    fn home_dir(&self) -> Option<String> {
        self.environment.home.clone()
    }

    fn changepwd(&mut self, path: &str) -> Result<()> {
        let target = Path::new(path);
        if !target.is_dir() {
            return Err(ShellError::NotFound(path.to_string()).into());
        }
        std::env::set_current_dir(target).map_err(|err| -> anyhow::Error {
            match err.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    ShellError::PermissionDenied(path.to_string()).into()
                }
                _ => ShellError::Io(err).into(),
            }
        })
    }

    fn current_umask(&self) -> u32 {
        self.umask_value
    }

    fn set_umask(&mut self, mask: u32) {
        umask(Mode::from_bits_truncate(mask));
        self.umask_value = mask;
        debug!("umask set to {:04o}", mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell {
        Shell::new(Environment::new())
    }

    #[test]
    fn job_ids_are_monotonic_within_a_session() {
        let mut shell = shell();
        assert_eq!(shell.get_next_job_id(), 1);
        assert_eq!(shell.get_next_job_id(), 2);
        assert_eq!(shell.get_next_job_id(), 3);
    }

    #[test]
    fn umask_roundtrip() {
        let mut shell = shell();
        assert_eq!(shell.current_umask(), DEFAULT_UMASK);
        shell.set_umask(0o077);
        assert_eq!(shell.current_umask(), 0o077);
        shell.set_umask(DEFAULT_UMASK);
    }

    #[test]
    fn changepwd_rejects_missing_directories() {
        let mut shell = shell();
        let before = std::env::current_dir().expect("cwd");
        let err = shell
            .changepwd("/nonexistent-msh-dir")
            .expect_err("missing dir must fail");
        assert!(matches!(
            err.downcast_ref::<ShellError>(),
            Some(ShellError::NotFound(_))
        ));
        assert_eq!(std::env::current_dir().expect("cwd"), before);
    }

    #[test]
    fn exit_marks_session_finished() {
        let mut shell = shell();
        assert!(shell.exited.is_none());
        shell.exit();
        assert_eq!(shell.exited, Some(ExitStatus::ExitedWith(0)));
        assert!(shell.wait_jobs.is_empty());
    }
}
