use super::ShellProxy;
use msh_types::{Context, ExitStatus};

pub fn command(ctx: &Context, _argv: Vec<String>, _proxy: &mut dyn ShellProxy) -> ExitStatus {
    let text = "\
Builtin commands:
  cd [dir]      change the current directory (default: $HOME)
  jobs          list background jobs
  fg [job]      bring a background job to the foreground
  umask [mask]  set or show the file creation mask
  exit          terminate the shell
  clear         clear the screen
  help          show this help
External commands are resolved through $PATH.";
    ctx.write_stdout(text).ok();
    ExitStatus::ExitedWith(0)
}
