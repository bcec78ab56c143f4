use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    filter::{FilterSpec, Range},
    io_utils,
    stats::Variable,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile school infrastructure with approval rates and analyze AC coverage",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Executive summary, per-source normalization report, and filter bounds
    Summary(SummaryArgs),
    /// Descriptive statistics for numeric fields
    Stats(StatsArgs),
    /// Pearson correlations between AC coverage, rooms, and scores
    Correlate(CorrelateArgs),
    /// Compare scores across AC-coverage bands and high/low AC halves
    Groups(GroupsArgs),
    /// Write the reconciled (and optionally filtered) record set as CSV/TSV
    Export(ExportArgs),
    /// Write the default column alias configuration as YAML
    Aliases(AliasesArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// The three source exports plus how to read them.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// School census export (infrastructure and dependency type)
    #[arg(long = "schools")]
    pub schools: PathBuf,
    /// Early-grade performance export
    #[arg(long = "early")]
    pub early: PathBuf,
    /// Final-grade performance export
    #[arg(long = "final")]
    pub final_: PathBuf,
    /// YAML alias configuration overriding the built-in column names
    #[arg(long = "aliases")]
    pub aliases: Option<PathBuf>,
    /// Delimiter for all inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Keep only this neighborhood ("Todos" or "All" keeps every one)
    #[arg(long)]
    pub neighborhood: Option<String>,
    /// AC percentage range as `min:max`
    #[arg(long = "ac-range")]
    pub ac_range: Option<Range>,
    /// Total classroom range as `min:max`
    #[arg(long = "rooms-range")]
    pub rooms_range: Option<Range>,
    /// Early-grade approval range as `min:max`; schools without a score are kept
    #[arg(long = "early-range")]
    pub early_range: Option<Range>,
    /// Final-grade approval range as `min:max`; schools without a score are kept
    #[arg(long = "final-range")]
    pub final_range: Option<Range>,
}

impl FilterArgs {
    pub fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            neighborhood: self.neighborhood.clone(),
            ac_percentage: self.ac_range,
            total_rooms: self.rooms_range,
            early_score: self.early_range,
            final_score: self.final_range,
        }
    }
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Fields to describe (defaults to every numeric field)
    #[arg(long = "fields", value_enum, value_delimiter = ',')]
    pub fields: Vec<Variable>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Also print the full correlation matrix
    #[arg(long)]
    pub matrix: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Output file (`-` for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Output delimiter (defaults from the output extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct AliasesArgs {
    /// Destination YAML file (`-` for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    io_utils::parse_delimiter(value).map_err(|err| err.to_string())
}
