use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use std::io;
use std::path::Path;
use std::process::ExitCode;
use symdir::cli::{Cli, Commands};
use symdir::output::{ConsoleLogger, Logger, Verbosity};
use symdir::{LOG_ENV, SymdirContext, commands};
use tracing_subscriber::EnvFilter;

/// Exit status for a run that completed with errors or warnings.
const EXIT_FAILURE: u8 = 1;
/// Exit status for unusable arguments or configuration.
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_diagnostics();

    let program = program_name();
    if let Some(shell) = completion_shell(&cli) {
        print_completions(shell, &mut Cli::command());
        return ExitCode::SUCCESS;
    }

    let ctx = match SymdirContext::new() {
        Ok(ctx) => ctx,
        Err(err) => {
            ConsoleLogger::new(program, Verbosity::Warnings)
                .error(format_args!("{err:#}"));
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let logger = ConsoleLogger::new(program, ctx.verbosity(cli.verbose));
    match run(&cli, &ctx, &logger) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILURE),
        Err(err) => {
            logger.error(format_args!("{err:#}"));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Runs the selected command; `Ok(false)` means errors or warnings were reported.
fn run(cli: &Cli, ctx: &SymdirContext, logger: &ConsoleLogger) -> Result<bool> {
    let Some((operation, dir, depth)) = cli.command.operation() else {
        return Ok(true);
    };
    let request = ctx.request(operation, dir, cli.collection.clone(), depth, cli.normalize);
    let flags = commands::execute(&request, logger)?;
    Ok(!flags.is_failure())
}

fn completion_shell(cli: &Cli) -> Option<clap_complete::Shell> {
    match cli.command {
        Commands::Completion { shell } => Some(shell),
        _ => None,
    }
}

fn init_diagnostics() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map_or_else(
            || "symdir".to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
