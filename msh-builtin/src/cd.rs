use super::ShellProxy;
use dirs;
use msh_types::{Context, ExitStatus};

/// `cd [path]` - change the interpreter's working directory.
///
/// With no argument the target is the home directory. Failure is reported
/// and leaves the working directory untouched; it never terminates the
/// interpreter.
pub fn command(ctx: &Context, argv: Vec<String>, proxy: &mut dyn ShellProxy) -> ExitStatus {
    let dir = match argv.get(1).map(|s| s.as_str()) {
        Some(dir) if dir.starts_with('~') => shellexpand::tilde(dir).to_string(),
        Some(dir) => dir.to_string(),
        None => match proxy.home_dir() {
            Some(home) => home,
            None => {
                if let Some(home_dir) = dirs::home_dir() {
                    home_dir.to_string_lossy().into_owned()
                } else {
                    String::from("/")
                }
            }
        },
    };

    match proxy.changepwd(&dir) {
        Ok(_) => ExitStatus::ExitedWith(0),
        Err(err) => {
            ctx.write_stderr(&format!("cd: {err}")).ok();
            ExitStatus::ExitedWith(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingProxy;
    use nix::unistd::getpid;

    fn ctx() -> Context {
        let pid = getpid();
        Context::new(pid, pid, false)
    }

    #[test]
    fn explicit_path_is_passed_through() {
        let mut proxy = RecordingProxy::default();
        let status = command(
            &ctx(),
            vec!["cd".to_string(), "/tmp".to_string()],
            &mut proxy,
        );
        assert_eq!(status, ExitStatus::ExitedWith(0));
        assert_eq!(proxy.pwd_changes, vec!["/tmp".to_string()]);
    }

    #[test]
    fn no_argument_defaults_to_home() {
        let mut proxy = RecordingProxy {
            home: Some("/home/someone".to_string()),
            ..Default::default()
        };
        let status = command(&ctx(), vec!["cd".to_string()], &mut proxy);
        assert_eq!(status, ExitStatus::ExitedWith(0));
        assert_eq!(proxy.pwd_changes, vec!["/home/someone".to_string()]);
    }

    #[test]
    fn failure_reports_and_returns_nonzero() {
        let mut proxy = RecordingProxy {
            fail_changepwd: true,
            ..Default::default()
        };
        let status = command(
            &ctx(),
            vec!["cd".to_string(), "/nonexistent".to_string()],
            &mut proxy,
        );
        assert_eq!(status, ExitStatus::ExitedWith(1));
        assert!(proxy.pwd_changes.is_empty());
    }
}
