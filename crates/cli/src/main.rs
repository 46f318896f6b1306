mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use hlapi_reader::SourceFormat;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Layout of the input directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FromFormat {
    Sheets,
    Tree,
}

impl From<FromFormat> for SourceFormat {
    fn from(format: FromFormat) -> Self {
        match format {
            FromFormat::Sheets => SourceFormat::Sheets,
            FromFormat::Tree => SourceFormat::Tree,
        }
    }
}

/// Artifact written by `convert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ToFormat {
    Schema,
    Markdown,
    Sheets,
}

impl From<ToFormat> for hlapi_writer::OutputFormat {
    fn from(format: ToFormat) -> Self {
        match format {
            ToFormat::Schema => hlapi_writer::OutputFormat::Schema,
            ToFormat::Markdown => hlapi_writer::OutputFormat::Markdown,
            ToFormat::Sheets => hlapi_writer::OutputFormat::Sheets,
        }
    }
}

/// HL-API specification toolchain.
#[derive(Parser)]
#[command(name = "hlapi", version, about = "HL-API specification toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log pipeline progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to a config file (default: ./hlapi.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a specification and print a summary of the resulting API
    Build {
        /// Sheet directory or schema tree
        input: PathBuf,
        /// Input layout (default: tree when <input>/api.json exists)
        #[arg(long, value_enum)]
        from: Option<FromFormat>,
    },

    /// Link a specification and write it in another format
    Convert {
        /// Sheet directory or schema tree
        input: PathBuf,
        /// Input layout (default: tree when <input>/api.json exists)
        #[arg(long, value_enum)]
        from: Option<FromFormat>,
        /// Artifact to write (default: schema)
        #[arg(long, value_enum)]
        to: Option<ToFormat>,
        /// Output directory (default: ./generated)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };
    logging::init(cli.verbose, config.log.level.as_deref());

    match cli.command {
        Commands::Build { input, from } => {
            commands::build::cmd_build(&input, from.map(Into::into), &config, cli.output, cli.quiet);
        }
        Commands::Convert {
            input,
            from,
            to,
            out,
        } => {
            commands::convert::cmd_convert(
                commands::convert::ConvertOptions {
                    input: &input,
                    from: from.map(Into::into),
                    to: to.map(Into::into),
                    out: out.as_deref(),
                },
                &config,
                cli.output,
                cli.quiet,
            );
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
