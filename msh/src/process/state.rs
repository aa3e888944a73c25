use nix::sys::signal::Signal;
use nix::unistd::Pid;

/// Lifecycle of one pipeline stage. Jobs derive their user-visible state
/// from their stages: all completed means done, none running means stopped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProcessState {
    Running,
    Completed(u8, Option<Signal>),
    Stopped(Pid, Signal),
}

impl ProcessState {
    pub fn is_completed(&self) -> bool {
        matches!(self, ProcessState::Completed(_, _))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ProcessState::Stopped(_, _))
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProcessState::Running => formatter.write_str("running"),
            ProcessState::Completed(_, signal) => match signal {
                Some(Signal::SIGKILL) => formatter.write_str("killed"),
                Some(Signal::SIGTERM) => formatter.write_str("terminated"),
                _ => formatter.write_str("done"),
            },
            ProcessState::Stopped(_, _) => formatter.write_str("stopped"),
        }
    }
}
