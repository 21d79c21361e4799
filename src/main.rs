use std::path::PathBuf;

use clap::{ArgAction, Parser};
use colored::Colorize;

mod codegen;
mod common;
mod driver;
mod error;
mod ingest;
mod symtable;
mod transpile;
mod types;

#[derive(Parser)]
#[command(name = "ctogo", version, about = "Translate C to Go through clang's AST dump")]
pub struct Cli {
    /// C file to translate
    #[arg(value_name = "INPUT", required_unless_present = "from_dump", value_hint = clap::ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output path, the input name with a `.go` extension by default
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Go package name
    #[arg(short, long, value_name = "NAME", default_value = "main")]
    package: String,

    /// Only print the AST dump and exit
    #[arg(short = 'a', long, default_value_t = false)]
    print_ast: bool,

    /// Read the AST dump from a file instead of running clang
    #[arg(long, value_name = "FILE")]
    from_dump: Option<PathBuf>,

    /// C compiler used to preprocess and dump the input
    #[arg(long, value_name = "PATH", default_value = "clang")]
    clang: String,

    /// Import root of the runtime packages
    #[arg(long, value_name = "IMPORT", default_value = transpile::DEFAULT_RUNTIME)]
    runtime: String,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Entry point, parses command line arguments and starts the translation.
pub fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = driver::run(cli) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
