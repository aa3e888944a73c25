use super::ShellProxy;
use msh_types::{Context, ExitStatus};
use std::fs::File;
use std::io::Write;
use std::mem;
use std::os::unix::io::FromRawFd;

pub fn command(ctx: &Context, _argv: Vec<String>, _proxy: &mut dyn ShellProxy) -> ExitStatus {
    // ANSI: cursor home, erase display
    let mut file = unsafe { File::from_raw_fd(ctx.outfile) };
    write!(&mut file, "\x1b[H\x1b[J").ok();
    file.flush().ok();
    mem::forget(file);
    ExitStatus::ExitedWith(0)
}
