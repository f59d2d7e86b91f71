use clap::Parser;
use japaya::translator::translate_path;
use japaya::worker::{PythonEvaluator, WorkerConfig};
use japaya::Context;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Translate hybrid Java/Python sources into plain Java.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file or directory
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,

    /// Output file or directory
    #[arg(long = "out", value_name = "PATH")]
    output: PathBuf,

    /// Python executable, optionally with arguments (default: python3/python)
    #[arg(long, env = "JAPAYA_PYTHON")]
    python: Option<String>,

    /// Directory added to the Python module search path for snippets
    #[arg(long, env = "JAPAYA_PY_DIR")]
    python_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!(?cli, "parsed arguments");

    let config = WorkerConfig {
        python: cli.python.clone(),
        python_dir: cli.python_dir.clone(),
    };
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        return ExitCode::from(2);
    }

    let py = match PythonEvaluator::start(&config) {
        Ok(py) => py,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = translate_path(&Context::background(), &cli.input, &cli.output, &py);

    if let Err(e) = py.close() {
        eprintln!("warning: failed to close python worker: {}", e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.diagnostic());
            ExitCode::FAILURE
        }
    }
}
