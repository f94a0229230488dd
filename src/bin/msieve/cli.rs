use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "msieve",
    about = "Screen sharded ASE databases for MXene-like compositions",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify every record of every shard and export a ranked CSV
    #[command(visible_alias = "f")]
    Filter(FilterArgs),

    /// Extract selected records into XYZ / extended XYZ
    #[command(visible_alias = "x")]
    Extract(ExtractArgs),

    /// Copy the header and first N rows of a CSV
    Head(HeadArgs),
}

impl Command {
    pub fn log(&self) -> &LogOptions {
        match self {
            Command::Filter(args) => &args.log,
            Command::Extract(args) => &args.log,
            Command::Head(args) => &args.log,
        }
    }
}

/// Console options shared by all commands.
#[derive(Args)]
pub struct LogOptions {
    /// Suppress banner, progress and tables (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Shard discovery options for the filter command.
#[derive(Args)]
#[command(next_help_heading = "Shard Discovery")]
pub struct ShardOptions {
    /// Directory searched for shards
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Shard file name pattern (glob, relative to --root); .aselmdb files
    /// are read as ASE LMDB, anything else as ASE SQLite
    #[arg(long, value_name = "GLOB", default_value = "db_*.aselmdb")]
    pub pattern: String,
}

/// Classification rule options.
#[derive(Args)]
#[command(next_help_heading = "Classification Rules")]
pub struct RuleOptions {
    /// TOML rule preset; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// M (transition metal) elements, comma-separated or repeated
    #[arg(long = "m-list", value_name = "EL", num_args = 1.., value_delimiter = ',')]
    pub m_list: Vec<String>,

    /// X elements, comma-separated or repeated
    #[arg(long = "x-list", value_name = "EL", num_args = 1.., value_delimiter = ',')]
    pub x_list: Vec<String>,

    /// Termination elements, comma-separated or repeated
    #[arg(long, value_name = "EL", num_args = 1.., value_delimiter = ',')]
    pub terminations: Vec<String>,

    /// Allow elements outside M ∪ X ∪ terminations
    #[arg(long)]
    pub no_require_only_allowed: bool,

    /// Do not require at least one M and one X element
    #[arg(long = "no-require-mx-pair")]
    pub no_require_mx_pair: bool,

    /// Do not require a termination element
    #[arg(long)]
    pub no_require_termination: bool,

    /// Allowed n values for M_(n+1)X_n
    #[arg(long = "n", value_name = "N", num_args = 1.., value_delimiter = ',')]
    pub allowed_n: Vec<u32>,

    /// Relative tolerance on the M/X ratio (0.2 = ±20%)
    #[arg(long = "ratio-tol", value_name = "TOL")]
    pub ratio_tolerance: Option<f64>,
}

#[derive(Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub shards: ShardOptions,

    #[command(flatten)]
    pub rules: RuleOptions,

    /// Output CSV
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "mxene_candidates.csv"
    )]
    pub output: PathBuf,

    #[command(flatten)]
    pub log: LogOptions,
}

/// Selection table column options.
#[derive(Args)]
#[command(next_help_heading = "Selection Columns")]
pub struct ColumnOptions {
    /// Single column holding combined ids (db_1.aselmdb:42, db_1.aselmdb#42, db_1.aselmdb,42)
    #[arg(long = "id-col", value_name = "NAME")]
    pub id_col: Option<String>,

    /// Column holding the shard file name
    #[arg(long = "db-col", value_name = "NAME")]
    pub db_col: Option<String>,

    /// Column holding the record index
    #[arg(long = "idx-col", value_name = "NAME")]
    pub idx_col: Option<String>,

    /// Indices in the table start at 1
    #[arg(long)]
    pub one_based: bool,
}

/// Extraction output options.
#[derive(Args)]
#[command(next_help_heading = "Output")]
pub struct ExtractOutputOptions {
    /// Combined output file
    #[arg(long, value_name = "FILE", default_value = "mxene_candidates.extxyz")]
    pub out: PathBuf,

    /// Write one .xyz file per record instead of a combined file
    #[arg(long)]
    pub per_structure: bool,

    /// Directory for per-record files
    #[arg(long, value_name = "DIR", default_value = "xyz_out")]
    pub out_dir: PathBuf,

    /// Structure format (inferred from --out when omitted)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<StructureFormat>,

    /// Stop after this many successful extractions
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Selection table (CSV with a header row)
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,

    /// Directory searched for shards
    #[arg(long = "db-dir", value_name = "DIR", default_value = ".")]
    pub db_dir: PathBuf,

    /// Shard file name pattern (glob, relative to --db-dir)
    #[arg(long = "db-glob", value_name = "GLOB", default_value = "*.aselmdb")]
    pub db_glob: String,

    #[command(flatten)]
    pub columns: ColumnOptions,

    #[command(flatten)]
    pub output: ExtractOutputOptions,

    #[command(flatten)]
    pub log: LogOptions,
}

#[derive(Args)]
pub struct HeadArgs {
    /// Input CSV
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output CSV (written with a UTF-8 byte-order mark)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Number of data rows to keep
    #[arg(short = 'n', long = "nrows", value_name = "N", default_value = "1200")]
    pub rows: usize,

    /// Treat the first line as data
    #[arg(long)]
    pub no_header: bool,

    #[command(flatten)]
    pub log: LogOptions,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StructureFormat {
    /// Plain XYZ
    Xyz,
    /// Extended XYZ with lattice, pbc and provenance tags
    #[value(alias = "ext-xyz")]
    Extxyz,
}

pub fn parse() -> Cli {
    Cli::parse()
}
