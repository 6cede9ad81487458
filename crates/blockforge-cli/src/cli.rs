use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "bforge - build, inspect and persist molecular building blocks annotated with reactive functional groups.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used by the batch command.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub build: BuildOptions,
}

/// Options shared by every command that constructs building blocks.
#[derive(Args, Debug, Default, Clone)]
pub struct BuildOptions {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use a custom motif table instead of the built-in functional group definitions.
    #[arg(long, global = true, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Keep every atom at the origin instead of generating coordinates.
    #[arg(long, global = true)]
    pub no_coordinates: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S embedding.relaxation-sweeps=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a block and print a report of its functional groups and bonder geometry.
    Inspect(InspectArgs),
    /// Build a block and write it to a dump file.
    Dump(DumpArgs),
    /// Build a block and write its structure as an MDL molfile.
    Export(ExportArgs),
    /// Build many blocks listed in a CSV file and dump each of them.
    Batch(BatchArgs),
    /// List the functional group motifs known to the registry.
    Motifs,
}

/// Where a single building block comes from. Exactly one source is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct StructureInput {
    /// A SMILES string.
    #[arg(long, value_name = "SMILES")]
    pub smiles: Option<String>,

    /// An MDL V2000 molfile; its coordinates are kept.
    #[arg(long, value_name = "PATH")]
    pub molfile: Option<PathBuf>,

    /// A previously written dump; its functional groups are kept as stored.
    #[arg(long = "load", value_name = "PATH")]
    pub dump: Option<PathBuf>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: StructureInput,

    /// Functional group motifs to perceive. Can be used multiple times.
    #[arg(short = 'f', long = "functional-group", value_name = "NAME")]
    pub functional_groups: Vec<String>,

    /// Write the report to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `dump` subcommand.
#[derive(Args, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub input: StructureInput,

    /// Functional group motifs to perceive. Can be used multiple times.
    #[arg(short = 'f', long = "functional-group", value_name = "NAME")]
    pub functional_groups: Vec<String>,

    /// Path of the dump file to write.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Attach an attribute and include it in the dump. Can be used multiple times.
    /// Example: -a cost=12.5 -a vendor=acme
    #[arg(short = 'a', long = "attr", value_name = "KEY=VALUE")]
    pub attributes: Vec<String>,
}

/// Arguments for the `export` subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: StructureInput,

    /// Path of the molfile to write.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Molecule name written to the molfile header.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// CSV file with the columns `label`, `smiles` and optionally
    /// `functional_groups` (names separated by spaces).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory receiving one `<label>.toml` dump per built block.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Build every row independently instead of sharing identical blocks.
    #[arg(long)]
    pub no_cache: bool,
}
