use anyhow::Result;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, kill, killpg, sigaction};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

static RECEIVED_SIGINT: AtomicBool = AtomicBool::new(false);

// The handler only sets the flag. The job table and foreground slot are
// off limits in signal context; the wait loop and line reader consume the
// flag and act on it.
extern "C" fn handle_sigint(_: i32) {
    RECEIVED_SIGINT.store(true, Ordering::SeqCst);
}

pub(crate) fn install_sigint_handler() -> Result<()> {
    let handler = SigHandler::Handler(handle_sigint);
    // No SA_RESTART: blocking read(2)/waitpid(2) must return EINTR so the
    // flag is observed between retries.
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    unsafe {
        sigaction(Signal::SIGINT, &action)?;
    }
    unblock_sigint()?;
    debug!("SIGINT handler installed");
    Ok(())
}

fn unblock_sigint() -> Result<()> {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    nix::sys::signal::sigprocmask(nix::sys::signal::SigmaskHow::SIG_UNBLOCK, Some(&set), None)?;
    Ok(())
}

pub(crate) fn check_and_clear_sigint() -> bool {
    RECEIVED_SIGINT.swap(false, Ordering::SeqCst)
}

/// Signal a pipeline's process group, falling back to the controlling
/// process when the group is already gone.
pub(crate) fn signal_job(pgid: Pid, pid: Pid, signal: Signal) -> Result<()> {
    match killpg(pgid, signal) {
        Ok(_) => Ok(()),
        Err(err) => {
            debug!("killpg {pgid} failed ({err}), falling back to pid {pid}");
            kill(pid, signal).map_err(|e| e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::getpid;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn sigint_sets_flag_without_killing_the_process() {
        install_sigint_handler().expect("failed to install handler");
        check_and_clear_sigint();

        kill(getpid(), Signal::SIGINT).expect("failed to signal self");
        thread::sleep(Duration::from_millis(50));

        assert!(check_and_clear_sigint());
        // Flag is one-shot
        assert!(!check_and_clear_sigint());
    }
}
