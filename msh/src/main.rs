use crate::environment::Environment;
use crate::repl::Repl;
use crate::shell::Shell;
use anyhow::Result;
use clap::Parser;
use msh_types::Context;
use std::process::ExitCode;
use tracing::debug;

mod environment;
mod errors;
mod parser;
mod process;
mod repl;
mod shell;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run a single command line and exit
    #[arg(short, long)]
    command: Option<String>,
}

fn main() -> ExitCode {
    if let Err(err) = init_tracing() {
        eprintln!("failed to initialize tracing: {err}");
        return ExitCode::FAILURE;
    }
    run_shell()
}

fn init_tracing() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn run_shell() -> ExitCode {
    let cli = Cli::parse();
    let environment = Environment::new();
    let mut shell = Shell::new(environment);
    shell.set_signals();

    if let Some(command) = cli.command.as_deref() {
        let mut ctx = Context::new(shell.pid, shell.pgid, false);
        execute_command(&mut shell, &mut ctx, command)
    } else {
        let interactive = nix::unistd::isatty(libc::STDIN_FILENO).unwrap_or(false);
        let mut ctx = Context::new(shell.pid, shell.pgid, interactive);
        run_interactive(&mut shell, &mut ctx)
    }
}

fn execute_command(shell: &mut Shell, ctx: &mut Context, command: &str) -> ExitCode {
    debug!("command mode: {:?}", command);
    match shell.eval_str(ctx, command.to_string()) {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            errors::display_user_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run_interactive(shell: &mut Shell, ctx: &mut Context) -> ExitCode {
    debug!("start shell");
    let mut repl = Repl::new(shell);
    match repl.run(ctx) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            errors::display_user_error(&err);
            ExitCode::FAILURE
        }
    }
}
