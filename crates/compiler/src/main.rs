//! Mica compiler CLI
//!
//! Compile C-subset sources to textual LLVM IR (.ll files) and run
//! front-end checks.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use micac::CompilerConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "micac")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mica compiler - compile C-subset sources to LLVM IR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to a .ll module
    Build {
        /// Input source file
        input: PathBuf,

        /// Output path (defaults to the input with a .ll extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// User include directory, searched for #include "..." (repeatable)
        #[arg(short = 'I', value_name = "DIR")]
        include: Vec<PathBuf>,

        /// System include directory, searched for #include <...> (repeatable)
        #[arg(long = "isystem", value_name = "DIR")]
        isystem: Vec<PathBuf>,

        /// Print the parsed AST instead of emitting IR
        #[arg(long)]
        emit_ast: bool,
    },

    /// Run the front end (through semantic analysis) without emitting IR
    Check {
        /// Input source file
        input: PathBuf,

        /// User include directory (repeatable)
        #[arg(short = 'I', value_name = "DIR")]
        include: Vec<PathBuf>,

        /// System include directory (repeatable)
        #[arg(long = "isystem", value_name = "DIR")]
        isystem: Vec<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            include,
            isystem,
            emit_ast,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("ll"));
            let config = build_config(&input, include, isystem);
            run_build(&input, &output, &config, emit_ast);
        }
        Commands::Check {
            input,
            include,
            isystem,
        } => {
            let config = build_config(&input, include, isystem);
            run_check(&input, &config);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "micac", &mut io::stdout());
        }
    }
}

fn build_config(input: &Path, include: Vec<PathBuf>, isystem: Vec<PathBuf>) -> CompilerConfig {
    let mut config = CompilerConfig::new();
    config.user_include_dirs = include;
    config.system_include_dirs = isystem;
    config.merge_config_file_for(input)
}

fn run_build(input: &Path, output: &Path, config: &CompilerConfig, emit_ast: bool) {
    if emit_ast {
        match micac::parse_path(input, config) {
            Ok(program) => println!("{:#?}", program),
            Err(e) => {
                eprintln!("Error [{}]: {}", e.stage(), e);
                process::exit(1);
            }
        }
        return;
    }
    match micac::compile_file(input, output, config) {
        Ok(()) => {
            println!("Compiled {} -> {}", input.display(), output.display());
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.stage(), e);
            process::exit(1);
        }
    }
}

fn run_check(input: &Path, config: &CompilerConfig) {
    match micac::check_path(input, config) {
        Ok(()) => println!("{}: no errors", input.display()),
        Err(e) => {
            eprintln!("Error [{}]: {}", e.stage(), e);
            process::exit(1);
        }
    }
}
