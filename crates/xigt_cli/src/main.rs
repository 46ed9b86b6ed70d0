//! `xigt` command-line entry point.
//!
//! # Responsibility
//! - Expose the core codec, importer and query helpers as subcommands.
//! - Keep stdout for command output and stderr for diagnostics.
//!
//! # Invariants
//! - Every failure prints one `error: ...` line on stderr and exits with 1.
//! - Output files are only created after the corpus was fully built.

use clap::{Parser, Subcommand, ValueHint};
use log::debug;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use xigt_core::{
    default_log_level, dump, dump_path, init_logging, init_stderr_logging, load_path,
    resolve_expression, xigt_import, ImportOptions, LoadMode, LoggingError,
};

#[derive(Parser)]
#[command(name = "xigt", version, about = "Read, write and import xigt JSON corpora")]
struct Cli {
    #[arg(long, help = "Log level: trace|debug|info|warn|error (default depends on build)")]
    log_level: Option<String>,
    #[arg(
        long,
        help = "Absolute directory for rolling log files (default: stderr)",
        value_hint = ValueHint::DirPath
    )]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a corpus and write it back with minimal namespace declarations.
    Normalize {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(short, long, help = "Output file (default: stdout)", value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "full", value_parser = parse_mode, help = "Load mode: full|transient|incremental")]
        mode: LoadMode,
    },
    /// Convert a Pangloss XML document into a xigt JSON corpus.
    ImportPangloss {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
        #[arg(long, default_value = "en", help = "Language of glosses and translations to keep")]
        lang: String,
    },
    /// Print the text selected by an alignment expression inside one igt.
    Resolve {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(long, help = "Igt id")]
        igt: String,
        #[arg(help = "Expression such as `p1[0:5]+p1[6:8]`")]
        expr: String,
    },
    /// Print the core library version.
    Version,
}

fn parse_mode(raw: &str) -> Result<LoadMode, String> {
    raw.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = setup_logging(&cli) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<(), LoggingError> {
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    match &cli.log_dir {
        Some(dir) => init_logging(level, dir),
        None => init_stderr_logging(level),
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Normalize {
            input,
            output,
            mode,
        } => {
            let corpus = load_path(&input, mode)?;
            match output {
                Some(path) => dump_path(&path, &corpus)?,
                None => {
                    dump(std::io::stdout().lock(), &corpus)?;
                    println!();
                }
            }
        }
        Command::ImportPangloss {
            input,
            output,
            lang,
        } => {
            let options = ImportOptions { gloss_lang: lang };
            let report = xigt_import(&input, &output, &options)?;
            println!("imported {} igts into {}", report.igts, report.output.display());
        }
        Command::Resolve { input, igt, expr } => {
            let corpus = load_path(&input, LoadMode::Full)?;
            let record = corpus
                .get(&igt)
                .ok_or_else(|| format!("no igt with id `{igt}` in {}", input.display()))?;
            debug!("event=resolve module=cli igt={} expr={}", igt, expr);
            println!("{}", resolve_expression(record, &expr)?);
        }
        Command::Version => println!("xigt_core version={}", xigt_core::core_version()),
    }
    Ok(())
}
