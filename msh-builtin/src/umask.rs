use super::ShellProxy;
use msh_types::{Context, ExitStatus};

/// `umask [octal]` - show or set the file creation mask.
///
/// Without an argument the current mask is printed in octal. An argument is
/// parsed as an octal value no greater than 0777 and becomes the new
/// process-wide mask applied to redirection targets.
pub fn command(ctx: &Context, argv: Vec<String>, proxy: &mut dyn ShellProxy) -> ExitStatus {
    match argv.get(1).map(|s| s.as_str()) {
        None => {
            ctx.write_stdout(&format!("{:04o}", proxy.current_umask()))
                .ok();
            ExitStatus::ExitedWith(0)
        }
        Some(arg) => match parse_mask(arg) {
            Ok(mask) => {
                proxy.set_umask(mask);
                ExitStatus::ExitedWith(0)
            }
            Err(msg) => {
                ctx.write_stderr(&format!("umask: {msg}")).ok();
                ExitStatus::ExitedWith(1)
            }
        },
    }
}

fn parse_mask(arg: &str) -> Result<u32, String> {
    let mask = u32::from_str_radix(arg, 8)
        .map_err(|_| format!("invalid argument: {arg}: not an octal mask"))?;
    if mask > 0o777 {
        return Err(format!(
            "invalid argument: {arg}: mask must be between 0 and 0777"
        ));
    }
    Ok(mask)
}
