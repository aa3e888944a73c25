use super::Shell;
use crate::process::signal::check_and_clear_sigint;
use crate::process::{Job, ProcessState};
use anyhow::Result;
use msh_types::{Context, ShellError};
use nix::unistd::Pid;
use tracing::debug;

pub fn get_next_job_id(shell: &mut Shell) -> usize {
    let id = shell.next_job_id;
    shell.next_job_id += 1;
    id
}

/// Reap pass: non-blocking poll of every tracked job, removing and
/// returning the ones whose processes have all exited. Tolerates an empty
/// table and never blocks.
pub fn check_job_state(shell: &mut Shell) -> Vec<Job> {
    if shell.wait_jobs.is_empty() {
        return Vec::new();
    }

    for job in &mut shell.wait_jobs {
        job.update_status();
    }

    let all_jobs = std::mem::take(&mut shell.wait_jobs);
    let (completed, active): (Vec<Job>, Vec<Job>) =
        all_jobs.into_iter().partition(|job| job.is_completed());
    shell.wait_jobs = active;

    for job in &completed {
        debug!("job [{}] completed: {}", job.job_id, job.cmd);
    }
    completed
}

/// Route a status collected while waiting on the foreground pipeline to
/// the background job that owns the pid.
pub fn record_background_state(shell: &mut Shell, pid: Pid, state: ProcessState) {
    for job in &mut shell.wait_jobs {
        if job.set_stage_state(pid, state) {
            return;
        }
    }
    debug!("status for untracked pid {pid} dropped");
}

/// Terminate all background jobs (SIGTERM to each pipeline's group).
pub fn terminate_background_jobs(shell: &mut Shell) -> Result<()> {
    for job in &mut shell.wait_jobs {
        if !job.foreground {
            let _ = job.kill();
        }
    }
    Ok(())
}

pub fn kill_wait_jobs(shell: &mut Shell) -> Result<()> {
    for job in &mut shell.wait_jobs {
        job.kill()?;
    }
    Ok(())
}

/// `jobs` - list the table after a reap pass, newly finished jobs first.
pub fn run_jobs(shell: &mut Shell, ctx: &Context) -> Result<()> {
    for job in check_job_state(shell) {
        ctx.write_stdout(&format!("[{}]  {}\t{}", job.job_id, job.state(), job.cmd))
            .ok();
    }
    for job in &shell.wait_jobs {
        ctx.write_stdout(&format!("[{}]  {}\t{}", job.job_id, job.state(), job.cmd))
            .ok();
    }
    Ok(())
}

/// `fg [jobId]` - continue a job in the foreground and wait for it.
/// Defaults to the most recently added job; the job leaves the table
/// unless it stops again under SIGTSTP.
pub fn run_fg(shell: &mut Shell, ctx: &Context, argv: Vec<String>) -> Result<()> {
    let mut job = take_job(shell, argv.get(1).map(|s| s.as_str()))?;
    ctx.write_stdout(&job.cmd).ok();

    job.foreground = true;
    if let Err(err) = job.cont() {
        // Already exited; the wait below still collects it.
        debug!("fg: continue failed for job [{}]: {err}", job.job_id);
    }

    shell.foreground = job.pgid.or_else(|| job.pid());
    let state = job.wait_until_done(shell);
    shell.foreground = None;
    check_and_clear_sigint();

    debug!("fg: job [{}] finished: {}", job.job_id, state);
    if !job.is_completed() {
        // Stopped again; keep tracking it under its old id.
        ctx.write_stdout(&format!("[{}]  {}\t{}", job.job_id, job.state(), job.cmd))
            .ok();
        shell.wait_jobs.push(job);
    }
    Ok(())
}

fn take_job(shell: &mut Shell, arg: Option<&str>) -> Result<Job> {
    match arg {
        Some(arg) => {
            let job_id: usize = arg.parse().map_err(|_| {
                anyhow::Error::from(ShellError::InvalidArgument(format!(
                    "{arg}: job id must be a number"
                )))
            })?;
            let index = shell
                .wait_jobs
                .iter()
                .position(|job| job.job_id == job_id)
                .ok_or_else(|| anyhow::Error::from(ShellError::NotFound(format!("job {job_id}"))))?;
            Ok(shell.wait_jobs.remove(index))
        }
        None => shell
            .wait_jobs
            .pop()
            .ok_or_else(|| anyhow::Error::from(ShellError::NotFound("no current job".to_string()))),
    }
}
