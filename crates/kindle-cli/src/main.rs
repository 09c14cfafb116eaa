//! Kindle CLI - Command-line interface for the Kindle expression language

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use kindle_core::bytecode::Heap;
use kindle_core::compiler::{CompileOptions, DEFAULT_MAX_DEPTH};
use tracing_subscriber::EnvFilter;

mod repl;
mod runner;

use runner::RunOptions;

#[derive(Parser)]
#[command(name = "kindle")]
#[command(version = kindle_core::VERSION)]
#[command(about = "The Kindle expression compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive REPL
    Repl {
        #[command(flatten)]
        compile: CompileArgs,
    },

    /// Evaluate a single expression
    Eval {
        /// The expression to evaluate
        expr: String,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        compile: CompileArgs,
    },

    /// Run a Kindle source file
    Run {
        /// Path to the source file
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        compile: CompileArgs,
    },

    /// Compile a source file and print its bytecode without running it
    Disasm {
        /// Path to the source file
        file: PathBuf,

        #[command(flatten)]
        compile: CompileArgs,
    },
}

/// Flags shared by every command that compiles
#[derive(Args, Debug, Clone, Copy)]
struct CompileArgs {
    /// Maximum expression nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Share constant pool slots between identical literals
    #[arg(long)]
    dedupe_constants: bool,
}

impl CompileArgs {
    fn options(self) -> CompileOptions {
        CompileOptions::new()
            .with_max_depth(self.max_depth)
            .with_dedupe_constants(self.dedupe_constants)
    }
}

/// Flags controlling diagnostic output
#[derive(Args, Debug, Clone, Copy)]
struct OutputArgs {
    /// Print the compiled bytecode before running it
    #[arg(long)]
    disassemble: bool,

    /// Print each compiler step to stderr
    #[arg(long)]
    trace: bool,
}

impl OutputArgs {
    fn run_options(self, compile: CompileArgs) -> RunOptions {
        RunOptions {
            compile: compile.options(),
            disassemble: self.disassemble,
            trace: self.trace,
            compile_only: false,
        }
    }
}

/// Install the log subscriber, filtered by `KINDLE_LOG` (default `warn`)
fn init_tracing() {
    let filter = EnvFilter::try_from_env("KINDLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let status = match cli.command {
        None => {
            repl::Repl::new(CompileOptions::default())?.run()?;
            return Ok(ExitCode::SUCCESS);
        }

        Some(Commands::Repl { compile }) => {
            repl::Repl::new(compile.options())?.run()?;
            return Ok(ExitCode::SUCCESS);
        }

        Some(Commands::Eval {
            expr,
            output,
            compile,
        }) => {
            let mut heap = Heap::new();
            runner::execute(
                &expr,
                "eval",
                &mut heap,
                output.run_options(compile),
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            )?
        }

        Some(Commands::Run {
            file,
            output,
            compile,
        }) => runner::execute_file(&file, output.run_options(compile))?,

        Some(Commands::Disasm { file, compile }) => {
            let options = RunOptions {
                compile: compile.options(),
                compile_only: true,
                ..RunOptions::default()
            };
            runner::execute_file(&file, options)?
        }
    };

    Ok(status.exit_code())
}
