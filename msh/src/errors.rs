use crate::shell::APP_NAME;
use msh_types::ShellError;
use tracing::debug;

/// Display an error in a user-facing format without a backtrace. Typed
/// shell errors print their own message; anything else is passed through.
pub fn display_user_error(err: &anyhow::Error) {
    match err.downcast_ref::<ShellError>() {
        Some(shell_err) => eprintln!("{APP_NAME}: {shell_err}"),
        None => eprintln!("{APP_NAME}: {err}"),
    }
    debug!("reported error: {err:?}");
}
