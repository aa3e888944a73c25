use anyhow::Result;
use msh_types::{Context, ExitStatus};
use tracing::debug;

// Builtin command modules
pub mod cd;
mod clear;
mod fg;
mod help;
mod jobs;
mod umask;

/// Trait that provides an interface for builtin commands to interact with the shell
/// This allows builtin commands to perform shell operations without direct coupling
pub trait ShellProxy {
    /// Initiates shell exit process
    fn exit_shell(&mut self);

    /// Dispatches a command to the shell's command execution system
    /// Used for commands that need the job table (`jobs`, `fg`)
    fn dispatch(&mut self, ctx: &Context, cmd: &str, argv: Vec<String>) -> Result<()>;

    /// Changes the current working directory and updates shell state
    fn changepwd(&mut self, path: &str) -> Result<()>;

    /// The home directory captured at startup, if any
    fn home_dir(&self) -> Option<String>;

    /// Returns the current file creation mask
    fn current_umask(&self) -> u32;

    /// Updates the process-wide file creation mask
    fn set_umask(&mut self, mask: u32);
}

/// Type alias for builtin command function signature
/// All builtin commands must conform to this signature
pub type BuiltinCommand =
    fn(ctx: &Context, argv: Vec<String>, proxy: &mut dyn ShellProxy) -> ExitStatus;

/// The closed set of commands implemented inside the interpreter.
/// Classification happens once per command line; everything else is routed
/// to the external pipeline launcher.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Builtin {
    Cd,
    Jobs,
    Fg,
    Umask,
    Exit,
    Help,
    Clear,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "cd" => Some(Builtin::Cd),
            "jobs" => Some(Builtin::Jobs),
            "fg" => Some(Builtin::Fg),
            "umask" => Some(Builtin::Umask),
            "exit" => Some(Builtin::Exit),
            "help" => Some(Builtin::Help),
            "clear" => Some(Builtin::Clear),
            _ => None,
        }
    }

    pub fn command(self) -> BuiltinCommand {
        match self {
            Builtin::Cd => cd::command,
            Builtin::Jobs => jobs::command,
            Builtin::Fg => fg::command,
            Builtin::Umask => umask::command,
            Builtin::Exit => exit,
            Builtin::Help => help::command,
            Builtin::Clear => clear::command,
        }
    }

    pub fn run(self, ctx: &Context, argv: Vec<String>, proxy: &mut dyn ShellProxy) -> ExitStatus {
        (self.command())(ctx, argv, proxy)
    }
}

/// Built-in exit command implementation
/// Initiates graceful shell termination
pub fn exit(_ctx: &Context, _argv: Vec<String>, proxy: &mut dyn ShellProxy) -> ExitStatus {
    debug!("Exit command called - initiating normal shell exit");
    proxy.exit_shell();
    ExitStatus::ExitedWith(0)
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingProxy;
    use super::*;
    use msh_types::Context;
    use nix::unistd::getpid;

    fn ctx() -> Context {
        let pid = getpid();
        Context::new(pid, pid, false)
    }

    #[test]
    fn lookup_classifies_builtin_names() {
        assert_eq!(Builtin::lookup("cd"), Some(Builtin::Cd));
        assert_eq!(Builtin::lookup("jobs"), Some(Builtin::Jobs));
        assert_eq!(Builtin::lookup("fg"), Some(Builtin::Fg));
        assert_eq!(Builtin::lookup("umask"), Some(Builtin::Umask));
        assert_eq!(Builtin::lookup("exit"), Some(Builtin::Exit));
        assert_eq!(Builtin::lookup("help"), Some(Builtin::Help));
        assert_eq!(Builtin::lookup("clear"), Some(Builtin::Clear));
        assert_eq!(Builtin::lookup("ls"), None);
        assert_eq!(Builtin::lookup(""), None);
    }

    #[test]
    fn exit_asks_the_shell_to_terminate() {
        let mut proxy = RecordingProxy::default();
        let status = Builtin::Exit.run(&ctx(), vec!["exit".to_string()], &mut proxy);
        assert_eq!(status, ExitStatus::ExitedWith(0));
        assert!(proxy.exited);
    }
}
