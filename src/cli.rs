use std::path::PathBuf;

use clap::Parser;

use header_checkr::LicenseFilter;

#[derive(Parser, Debug)]
#[command(
    name = "header-checkr",
    about = "Check source file headers for approved licenses",
    version
)]
pub struct Cli {
    /// Files to check
    pub files: Vec<PathBuf>,

    /// Config file [default: ./.header-checkr/config.toml, fallback ~/.config/header-checkr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Additional XML license definitions (repeatable)
    #[arg(long = "licenses", value_name = "FILE")]
    pub licenses: Vec<PathBuf>,

    /// Do not load the built-in license definitions
    #[arg(long)]
    pub no_default_licenses: bool,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Number of header lines to scan per file
    #[arg(long, value_name = "N")]
    pub max_lines: Option<usize>,

    /// List configured licenses and exit
    #[arg(long, value_name = "FILTER", num_args = 0..=1, default_missing_value = "all")]
    pub list_licenses: Option<FilterArg>,

    /// List configured license families and exit
    #[arg(long, value_name = "FILTER", num_args = 0..=1, default_missing_value = "all")]
    pub list_families: Option<FilterArg>,

    /// Show every file (not just unapproved ones)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level or filter directive
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum FilterArg {
    All,
    Approved,
    None,
}

impl From<FilterArg> for LicenseFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => LicenseFilter::All,
            FilterArg::Approved => LicenseFilter::Approved,
            FilterArg::None => LicenseFilter::None,
        }
    }
}
