#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use commands::compile::{CompileOptions, ModuleFormat};
use dewc_core::Config;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dewc")]
#[command(author, version, about = "Compile CommonJS packages into dew modules", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Load settings from a JSON config file
    #[arg(long, global = true, value_name = "FILE", env = "DEWC_CONFIG")]
    config: Option<PathBuf>,

    /// Build for production (process.env.NODE_ENV becomes "production")
    #[arg(long, global = true)]
    production: bool,

    /// Count optionalDependencies as declared when reading --manifest
    #[arg(long, global = true)]
    include_optional: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Serve the transform worker protocol on stdin/stdout
    Worker,

    /// Resolve one specifier against a package descriptor
    Resolve {
        /// Specifier as written in source
        specifier: String,

        /// Importing file
        #[arg(long, value_name = "FILE")]
        from: PathBuf,

        /// Package descriptor snapshot (JSON)
        #[arg(long, value_name = "FILE")]
        package: PathBuf,

        /// package.json whose dependencies replace the descriptor's
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,
    },

    /// Compile one file
    Compile {
        /// File to compile
        file: PathBuf,

        /// Package descriptor snapshot (JSON)
        #[arg(long, value_name = "FILE")]
        package: PathBuf,

        /// package.json whose dependencies replace the descriptor's
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,

        /// Module format (default: from the file extension)
        #[arg(long, value_enum)]
        format: Option<ModuleFormat>,

        /// Output file; the source map is written next to it (default: stdout)
        #[arg(long, short = 'o')]
        outfile: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);
    if let Some(path) = &cli.config {
        config = config.load_file(&cwd.join(path)).into_diagnostic()?;
    }
    if cli.production {
        config = config.with_production(true);
    }
    if cli.include_optional {
        config = config.with_include_optional(true);
    }

    // Version output goes straight to stdout
    if !matches!(cli.command, Commands::Version) {
        logging::init(config.verbosity, config.json_logs);
    }

    match cli.command {
        Commands::Version => commands::version::run(cli.json),
        Commands::Worker => commands::worker::run(),
        Commands::Resolve {
            specifier,
            from,
            package,
            manifest,
        } => {
            let pkg = commands::load_package(&config, &package, manifest.as_deref())?;
            let importer = commands::absolute(&config, &from);
            commands::resolve::run(&specifier, &importer, &pkg, cli.json)
        }
        Commands::Compile {
            file,
            package,
            manifest,
            format,
            outfile,
        } => {
            let pkg = commands::load_package(&config, &package, manifest.as_deref())?;
            let options = CompileOptions {
                file,
                format,
                outfile,
                json: cli.json,
            };
            commands::compile::run(options, &pkg, &config)
        }
    }
}
