//! `lumina` CLI — the thin command-line driver around the compiler core.
//!
//! This binary owns argument parsing and logging only; all compiler
//! intellectual content (HM inference, monomorphization, IR lowering/
//! optimization, back-end emission) lives in `lumina-drv` and the crates
//! it orchestrates. Lexing and parsing are an external collaborator's
//! responsibility (spec §1 Non-goals) — `compile`/`check` will surface
//! `LuminaError::NoParserAvailable` until a real parser is wired into
//! `lumina_drv::Session`.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{check::CheckArgs, compile::CompileArgs, watch::WatchArgs};
use error::{CliError, Result};
use lumina_drv::{EmitType, Target};

/// Lumina — a small statically-typed language with HM type inference.
#[derive(Parser, Debug)]
#[command(name = "lumina")]
#[command(author = "Lumina Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The Lumina compiler", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true, env = "LUMINA_VERBOSE")]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true, env = "LUMINA_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline and emit output.
    Compile(CompileCommand),
    /// Parse + both analysis phases; no emission.
    Check(CheckCommand),
    /// Repeatedly compile on file change (not implemented by this core).
    Watch(WatchCommand),
    /// Interactive use (not implemented by this core).
    Repl,
}

#[derive(Parser, Debug)]
struct CompileCommand {
    /// Source file to compile.
    input: PathBuf,

    /// Output file (default: stdout).
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Emission target.
    #[arg(long, default_value = "esm")]
    target: String,

    /// What to emit instead of the final back-end output.
    #[arg(long, value_parser = ["ast", "hir", "ir", "output"])]
    emit: Option<String>,

    /// Path passed through to the parser collaborator's grammar file.
    #[arg(long)]
    grammar: Option<PathBuf>,

    /// Treat warning-severity diagnostics as errors for gating purposes.
    #[arg(long)]
    warnings_as_errors: bool,
}

#[derive(Parser, Debug)]
struct CheckCommand {
    /// Source file to check.
    input: PathBuf,
}

#[derive(Parser, Debug)]
struct WatchCommand {
    /// Source file to watch.
    input: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.no_color) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match execute_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };

    let subscriber = fmt::layer().with_ansi(!no_color).with_target(false).with_thread_ids(false).with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| CliError::Driver(lumina_drv::LuminaError::InvalidArguments(format!("failed to initialize logging: {e}"))))
}

fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Compile(args) => commands::compile::run(parse_compile_args(args)?),
        Commands::Check(args) => commands::check::run(CheckArgs { input: args.input, verbose: false }),
        Commands::Watch(args) => commands::watch::run(WatchArgs { input: args.input }),
        Commands::Repl => commands::repl::run(),
    }
}

fn parse_compile_args(args: CompileCommand) -> Result<CompileArgs> {
    let target = Target::parse(&args.target)?;
    let emit = match args.emit.as_deref() {
        Some("ast") => EmitType::Ast,
        Some("hir") => EmitType::Hir,
        Some("ir") => EmitType::Ir,
        Some("output") | None => EmitType::Output,
        Some(_) => unreachable!("clap value_parser restricts to known emit stages"),
    };
    Ok(CompileArgs {
        input: args.input,
        output: args.out,
        target,
        emit,
        grammar: args.grammar,
        warnings_as_errors: args.warnings_as_errors,
        verbose: false,
    })
}
