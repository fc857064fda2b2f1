//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Nyaya - Score documents for legal compliance against a knowledge graph.
#[derive(Debug, Parser)]
#[command(name = "nyaya")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Knowledge-base file (TOML or JSON)
    #[arg(long, global = true, env = "NYAYA_KB")]
    pub kb: Option<PathBuf>,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true, env = "NYAYA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Embedding provider
    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderArg>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// Embedding provider options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// Offline hashed bag-of-stems
    Lexical,
    /// Local Ollama server
    Ollama,
}

/// Engine configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Default thresholds
    Default,
    /// Fewer frameworks, higher floors
    Strict,
    /// More frameworks, lower floors
    Lenient,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a document and print its compliance report
    Analyze(AnalyzeArgs),

    /// Load and validate a knowledge base, then print its statistics
    Validate,

    /// List Articles related to an Article
    Neighbors(NeighborsArgs),

    /// Search Articles by keyword or by similarity
    Search(SearchArgs),

    /// Show which frameworks apply to a document
    Classify(ClassifyArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Document file (JSON clauses, or plain text with blank-line separated clauses)
    #[arg(short, long)]
    pub document: PathBuf,

    /// Configuration preset, used when no configuration file is given
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Print the evidence behind every dimension
    #[arg(short, long)]
    pub explain: bool,
}

/// Arguments for the neighbors command.
#[derive(Debug, Parser)]
pub struct NeighborsArgs {
    /// Article id
    pub article: String,

    /// Relation types to follow (references, amends, conflicts_with)
    #[arg(short, long, value_delimiter = ',', default_value = "references,amends,conflicts_with")]
    pub relations: Vec<String>,

    /// Maximum traversal depth
    #[arg(short = 'n', long, default_value = "2")]
    pub depth: usize,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Search terms
    #[arg(required = true)]
    pub terms: Vec<String>,

    /// Rank by embedding similarity instead of keywords
    #[arg(short, long)]
    pub semantic: bool,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for the classify command.
#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    /// Document file (JSON clauses, or plain text with blank-line separated clauses)
    #[arg(short, long)]
    pub document: PathBuf,

    /// Show every framework, including those below the confidence threshold
    #[arg(short, long)]
    pub all: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

impl From<ProviderArg> for crate::config::ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Lexical => crate::config::ProviderKind::Lexical,
            ProviderArg::Ollama => crate::config::ProviderKind::Ollama,
        }
    }
}

impl From<PresetArg> for nyaya_engine::EngineConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => nyaya_engine::EngineConfig::default(),
            PresetArg::Strict => nyaya_engine::EngineConfig::strict(),
            PresetArg::Lenient => nyaya_engine::EngineConfig::lenient(),
        }
    }
}
