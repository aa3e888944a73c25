use super::Shell;
use crate::parser::{self, ParsedLine};
use crate::process::{Job, Process, ProcessState, Redirect};
use anyhow::Result;
use msh_builtin::Builtin;
use msh_types::{Context, ExitStatus, ShellError};
use tracing::debug;

/// Dispatch one command line: builtins run synchronously in-process,
/// everything else becomes an external pipeline.
pub fn eval_str(shell: &mut Shell, ctx: &mut Context, input: String) -> Result<i32> {
    ctx.reset();
    let Some(parsed) = parser::tokenize(&input)? else {
        return Ok(0);
    };

    if let Some(builtin) = Builtin::lookup(&parsed.commands[0][0]) {
        let argv = parsed.commands[0].clone();
        debug!("builtin {:?} argv {:?}", builtin, argv);
        let code = match builtin.run(ctx, argv, shell) {
            ExitStatus::ExitedWith(code) => code,
            ExitStatus::Running(_) => 0,
        };
        return Ok(code);
    }

    run_pipeline(shell, ctx, parsed, input.trim().to_string())
}

fn run_pipeline(
    shell: &mut Shell,
    ctx: &mut Context,
    parsed: ParsedLine,
    display: String,
) -> Result<i32> {
    // Resolve every stage before anything is forked.
    let mut processes = Vec::with_capacity(parsed.commands.len());
    for argv in &parsed.commands {
        let name = &argv[0];
        let path = shell
            .environment
            .lookup(name)
            .ok_or_else(|| ShellError::NotFound(name.to_string()))?;
        processes.push(Process::new(path, argv.clone()));
    }

    let redirect = Redirect {
        stdin: parsed.redirect_in,
        stdout: parsed.redirect_out,
        stderr: parsed.redirect_err,
    };
    let mut job = Job::new(display, processes, redirect, !parsed.background);

    match job.launch(ctx, shell) {
        Ok(state) => {
            if !job.foreground {
                let pid = job.pid();
                let job_id = shell.insert_job(job);
                if let Some(pid) = pid {
                    ctx.write_stdout(&format!("[{job_id}] {pid}")).ok();
                }
                return Ok(0);
            }
            if !job.is_completed() {
                // Stopped under SIGTSTP: park it as a tracked job.
                let cmd = job.cmd.clone();
                let state = job.state();
                let job_id = shell.insert_job(job);
                ctx.write_stdout(&format!("[{job_id}]  {state}\t{cmd}")).ok();
                return Ok(148);
            }
            match state {
                ProcessState::Completed(code, _) => Ok(code as i32),
                _ => Ok(0),
            }
        }
        Err(err) => {
            // A partially launched pipeline still gets reaped: park
            // whatever forked so the reap pass retires it.
            if job.has_live_process() {
                job.foreground = false;
                shell.insert_job(job);
            }
            Err(err)
        }
    }
}
