use anyhow::Result;
use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use msh_types::{Context, ShellError};
use nix::sys::signal::Signal;
use nix::unistd::{Pid, pipe, setpgid};
use std::os::unix::io::RawFd;
use tracing::{debug, warn};

use super::fork::fork_stage;
use super::io::close_fd;
use super::process::Process;
use super::redirect::Redirect;
use super::signal;
use super::state::ProcessState;
use super::wait::{WaitOutcome, wait_any_blocking};
use crate::shell::Shell;

/// One pipeline, launched or about to be. Foreground jobs are waited on
/// synchronously; background jobs live in the shell's job table until the
/// reaper retires them.
#[derive(Debug)]
pub struct Job {
    pub job_id: usize,
    pub cmd: String,
    pub pgid: Option<Pid>,
    pub processes: Vec<Process>,
    pub redirect: Redirect,
    pub foreground: bool,
}

impl Job {
    pub fn new(cmd: String, processes: Vec<Process>, redirect: Redirect, foreground: bool) -> Self {
        Job {
            job_id: 0,
            cmd,
            pgid: None,
            processes,
            redirect,
            foreground,
        }
    }

    /// The controlling identifier: the last stage's pid, following the
    /// convention that job control targets the pipeline as a whole.
    pub fn pid(&self) -> Option<Pid> {
        self.processes.last().and_then(|p| p.pid)
    }

    pub fn is_completed(&self) -> bool {
        self.processes.iter().all(|p| p.state.is_completed())
    }

    /// No stage is running anymore; completed stages count, so a fully
    /// completed job is also stopped in this sense.
    pub fn is_stopped(&self) -> bool {
        !self
            .processes
            .iter()
            .any(|p| p.state == ProcessState::Running)
    }

    /// Whether any forked stage is still alive (used to park partially
    /// launched pipelines for the reaper).
    pub fn has_live_process(&self) -> bool {
        self.processes
            .iter()
            .any(|p| p.pid.is_some() && !p.state.is_completed())
    }

    /// The user-visible job state, derived from the stages.
    pub fn state(&self) -> ProcessState {
        if let Some(p) = self.processes.iter().find(|p| p.state.is_stopped()) {
            return p.state;
        }
        if self.is_completed() {
            self.processes
                .last()
                .map(|p| p.state)
                .unwrap_or(ProcessState::Completed(0, None))
        } else {
            ProcessState::Running
        }
    }

    pub(crate) fn set_stage_state(&mut self, pid: Pid, state: ProcessState) -> bool {
        for p in &mut self.processes {
            if p.pid == Some(pid) {
                debug!("set stage state {} pid:{} {}", p.cmd, pid, state);
                p.state = state;
                return true;
            }
        }
        false
    }

    /// Launch every stage: allocate the N-1 pipes, then fork stage by
    /// stage, wiring each child's streams to its neighbours or the
    /// resolved redirection targets. The parent closes every descriptor it
    /// does not need so downstream readers eventually observe end-of-file.
    pub fn launch(&mut self, ctx: &mut Context, shell: &mut Shell) -> Result<ProcessState> {
        ctx.foreground = self.foreground;

        let mut resolved = self.redirect.resolve()?;
        let stage_count = self.processes.len();

        let mut pipes: Vec<(RawFd, RawFd)> = Vec::with_capacity(stage_count.saturating_sub(1));
        for _ in 1..stage_count {
            match pipe() {
                Ok(pair) => pipes.push(pair),
                Err(errno) => {
                    for (read_end, write_end) in &pipes {
                        close_fd(*read_end);
                        close_fd(*write_end);
                    }
                    resolved.close_all();
                    return Err(ShellError::Io(std::io::Error::from_raw_os_error(
                        errno as i32,
                    ))
                    .into());
                }
            }
        }

        let redirect_fds = resolved.fds();
        let mut launch_err: Option<ShellError> = None;

        for i in 0..stage_count {
            let stdin = if i == 0 {
                resolved.stdin.unwrap_or(STDIN_FILENO)
            } else {
                pipes[i - 1].0
            };
            let stdout = if i == stage_count - 1 {
                resolved.stdout.unwrap_or(STDOUT_FILENO)
            } else {
                pipes[i].1
            };
            let stderr = if i == stage_count - 1 {
                resolved.stderr.unwrap_or(STDERR_FILENO)
            } else {
                STDERR_FILENO
            };

            let process = &mut self.processes[i];
            process.stdin = stdin;
            process.stdout = stdout;
            process.stderr = stderr;

            match fork_stage(process, self.pgid, &pipes, &redirect_fds) {
                Ok(pid) => {
                    process.pid = Some(pid);
                    let pgid = *self.pgid.get_or_insert(pid);
                    // Mirror the child's setpgid to close the startup race;
                    // EACCES just means the child exec'd first.
                    if let Err(err) = setpgid(pid, pgid) {
                        debug!("parent setpgid pid:{pid} pgid:{pgid}: {err}");
                    }
                }
                Err(err) => {
                    launch_err = Some(err);
                    break;
                }
            }
        }

        for (read_end, write_end) in &pipes {
            close_fd(*read_end);
            close_fd(*write_end);
        }
        resolved.close_all();

        if let Some(err) = launch_err {
            // Stages forked before the failure keep running; the caller
            // parks this job in the table so the reaper retires them.
            return Err(err.into());
        }

        if self.foreground {
            self.put_in_foreground(shell)
        } else {
            Ok(ProcessState::Running)
        }
    }

    fn put_in_foreground(&mut self, shell: &mut Shell) -> Result<ProcessState> {
        debug!("put_in_foreground: {} pgid {:?}", self.cmd, self.pgid);
        shell.foreground = self.pgid.or_else(|| self.pid());
        let state = self.wait_until_done(shell);
        shell.foreground = None;
        // Drop an interrupt already consumed by the job
        signal::check_and_clear_sigint();
        Ok(state)
    }

    /// Blocking wait for this pipeline. Statuses observed for other
    /// children while blocked here belong to background jobs and are
    /// routed to the job table instead of being dropped. An interrupt is
    /// forwarded to this pipeline's process group.
    pub(crate) fn wait_until_done(&mut self, shell: &mut Shell) -> ProcessState {
        while !self.is_completed() && !self.is_stopped() {
            match wait_any_blocking() {
                WaitOutcome::Status(pid, state) => {
                    if !self.set_stage_state(pid, state) {
                        shell.record_background_state(pid, state);
                    }
                }
                WaitOutcome::Interrupted => {
                    // The foreground slot names the group to interrupt;
                    // with no foreground job the interrupt is a no-op.
                    if signal::check_and_clear_sigint()
                        && let Some(pgid) = shell.foreground
                        && let Some(pid) = self.pid()
                        && let Err(err) = signal::signal_job(pgid, pid, Signal::SIGINT)
                    {
                        warn!("failed to interrupt foreground job: {err}");
                    }
                }
                WaitOutcome::NoChildren => {
                    // Nothing left to wait for: mark the remainder done.
                    for p in &mut self.processes {
                        if !p.state.is_completed() {
                            p.state = ProcessState::Completed(1, None);
                        }
                    }
                }
            }
        }
        self.state()
    }

    /// Non-blocking poll of every stage; true once the whole pipeline has
    /// been reaped.
    pub fn update_status(&mut self) -> bool {
        for p in &mut self.processes {
            if p.pid.is_none() {
                // Never forked (failed launch); nothing to reap.
                p.state = ProcessState::Completed(1, None);
                continue;
            }
            p.update_state();
        }
        self.is_completed()
    }

    /// Resume a stopped job (SIGCONT to the group) and reflect that in the
    /// stage states so the next wait actually blocks.
    pub fn cont(&mut self) -> Result<()> {
        if let (Some(pgid), Some(pid)) = (self.pgid, self.pid()) {
            signal::signal_job(pgid, pid, Signal::SIGCONT)?;
        }
        for p in &mut self.processes {
            if p.state.is_stopped() {
                p.state = ProcessState::Running;
            }
        }
        Ok(())
    }

    /// Terminate the job's process group.
    pub fn kill(&mut self) -> Result<()> {
        if self.is_completed() {
            return Ok(());
        }
        if let (Some(pgid), Some(pid)) = (self.pgid, self.pid()) {
            debug!("terminating job {} pgid {}", self.job_id, pgid);
            signal::signal_job(pgid, pid, Signal::SIGTERM)?;
        }
        Ok(())
    }
}
