use crate::errors::display_user_error;
use crate::process::signal::check_and_clear_sigint;
use crate::shell::Shell;
use anyhow::{Context as _, Result};
use console::style;
use libc::STDIN_FILENO;
use msh_types::Context;
use nix::errno::Errno;
use nix::unistd::read;
use std::io::Write;

/// The read-eval loop. Line editing is deliberately minimal: the terminal
/// stays in canonical mode and read(2) hands us whole lines, which also
/// works unchanged when stdin is a pipe.
pub struct Repl<'a> {
    pub shell: &'a mut Shell,
    pending: String,
}

impl<'a> Repl<'a> {
    pub fn new(shell: &'a mut Shell) -> Self {
        Repl {
            shell,
            pending: String::new(),
        }
    }

    fn prompt(&self) -> String {
        let cwd = std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "?".to_string());
        let marker = format!("{}>", crate::shell::APP_NAME);
        format!("{} {} ", style(cwd).green(), style(marker).red())
    }

    pub fn run(&mut self, ctx: &mut Context) -> Result<()> {
        loop {
            self.report_finished_jobs(ctx);
            if self.shell.exited.is_some() {
                break;
            }

            let prompt = if ctx.interactive {
                self.prompt()
            } else {
                String::new()
            };
            if ctx.interactive {
                let mut out = std::io::stdout();
                write!(out, "{prompt}").ok();
                out.flush().ok();
            }

            match self.read_line(&prompt)? {
                Some(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if let Err(err) = self.shell.eval_str(ctx, line) {
                        display_user_error(&err);
                    }
                }
                None => {
                    // end of input
                    self.shell.exit();
                    break;
                }
            }
        }
        Ok(())
    }

    /// Report and retire background jobs that finished since the last
    /// prompt. Runs before each command line is read.
    fn report_finished_jobs(&mut self, ctx: &Context) {
        for job in self.shell.check_job_state() {
            ctx.write_stdout(&format!("[{}]  {}\t{}", job.job_id, job.state(), job.cmd))
                .ok();
        }
    }

    /// EINTR-aware line read. An interrupt with no foreground job is a
    /// no-op that redisplays the prompt.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            if let Some(pos) = self.pending.find('\n') {
                let mut line: String = self.pending.drain(..=pos).collect();
                line.pop();
                return Ok(Some(line));
            }

            let mut buf = [0u8; 4096];
            match read(STDIN_FILENO, &mut buf) {
                Ok(0) => {
                    if self.pending.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(std::mem::take(&mut self.pending)));
                }
                Ok(n) => self.pending.push_str(&String::from_utf8_lossy(&buf[..n])),
                Err(Errno::EINTR) => {
                    if check_and_clear_sigint() {
                        let mut out = std::io::stdout();
                        write!(out, "\n{prompt}").ok();
                        out.flush().ok();
                    }
                }
                Err(err) => return Err(err).context("failed to read from stdin"),
            }
        }
    }
}
