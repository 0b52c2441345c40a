use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use lumen_core::MetadataOverrides;
use lumen_io::Format;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert between IES, EULUMDAT and CIE photometric files", long_about = None)]
pub struct Cli {
    /// Set the logging level (defaults to the config file, then "info")
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Config file (defaults to ~/.lumen/config/lumen.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Guess the format of a file
    Detect {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Convert one file to another format
    Convert {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Target format (ies, ldt, cie)
        #[arg(long, value_parser = parse_format)]
        to: Format,
        /// Source format; detected from content when omitted
        #[arg(long, value_parser = parse_format)]
        from: Option<Format>,
        /// Output path; defaults to the input with the target's extension
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Fail when the conversion produced any warning
        #[arg(long)]
        strict: bool,
        /// Print a JSON report instead of plain text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Parse a file and run the plausibility checks
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Source format; detected from content when omitted
        #[arg(long, value_parser = parse_format)]
        from: Option<Format>,
        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        json: bool,
    },
    /// Describe supported formats
    Info {
        /// Format identifier; all formats when omitted
        #[arg(value_parser = parse_format)]
        format: Option<Format>,
        #[arg(long)]
        json: bool,
    },
    /// Convert many files in parallel
    Batch {
        /// Files or directories; directories are searched recursively
        #[arg(required = true, value_hint = ValueHint::AnyPath)]
        inputs: Vec<PathBuf>,
        #[arg(long, value_parser = parse_format)]
        to: Format,
        /// Output directory for converted files and the manifest
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output: PathBuf,
        /// Worker threads (0 = all cores; defaults to the config file)
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long)]
        strict: bool,
        /// Keep files an earlier run in the same output directory already converted
        #[arg(long)]
        resume: bool,
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Metadata replacements applied between parse and write.
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    #[arg(long)]
    pub manufacturer: Option<String>,
    #[arg(long)]
    pub catalog_number: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub luminaire_type: Option<String>,
    #[arg(long)]
    pub test_lab: Option<String>,
    #[arg(long)]
    pub test_date: Option<String>,
    #[arg(long)]
    pub test_number: Option<String>,
}

impl From<OverrideArgs> for MetadataOverrides {
    fn from(args: OverrideArgs) -> Self {
        MetadataOverrides {
            manufacturer: args.manufacturer,
            catalog_number: args.catalog_number,
            description: args.description,
            luminaire_type: args.luminaire_type,
            test_lab: args.test_lab,
            test_date: args.test_date,
            test_number: args.test_number,
        }
    }
}

fn parse_format(id: &str) -> Result<Format, String> {
    id.parse::<Format>().map_err(|err| err.message)
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
