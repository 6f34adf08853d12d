//! Command-line interface argument parsing.

use crate::selection::{FilterSelection, Selection};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Patient feedback dashboard
///
/// Loads the complaints export and the fact to 4P principle mapping, then
/// renders the dashboard panels for the chosen filters. Without --batch an
/// interactive menu is shown.
///
/// Examples:
///   pos_dashboard
///   pos_dashboard --batch --year 2022,2023 --category "Качество"
///   pos_dashboard --complaints export.csv --mapping 4p.csv --out report/
///   pos_dashboard --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for pos_dashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a default pos_dashboard.toml and exit
    #[arg(long)]
    pub init_config: bool,

    /// Complaints export (overrides the config file)
    #[arg(long, value_name = "FILE", env = "POS_COMPLAINTS")]
    pub complaints: Option<PathBuf>,

    /// Fact to 4P principle mapping (overrides the config file)
    #[arg(long, value_name = "FILE", env = "POS_MAPPING")]
    pub mapping: Option<PathBuf>,

    /// Directory for exported panel files
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Render once from the filter flags and exit
    #[arg(long)]
    pub batch: bool,

    /// Years to include (comma-separated); all years by default
    #[arg(long = "year", value_name = "YEARS", value_delimiter = ',')]
    pub years: Vec<i32>,

    /// Organization to include; repeat for several. "All" disables the filter
    #[arg(long = "org", value_name = "NAME")]
    pub organizations: Vec<String>,

    /// Category to include; repeat for several. "All" disables the filter
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Subcategory to include; repeat for several. "All" disables the filter
    #[arg(long = "subcategory", value_name = "NAME")]
    pub subcategories: Vec<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    /// Filter selection described by the command-line flags.
    pub fn filter_selection(&self) -> FilterSelection {
        FilterSelection {
            years: if self.years.is_empty() {
                Selection::AllOf
            } else {
                Selection::subset(self.years.iter().copied())
            },
            organizations: Selection::<String>::from_values(self.organizations.iter().map(String::as_str)),
            categories: Selection::<String>::from_values(self.categories.iter().map(String::as_str)),
            subcategories: Selection::<String>::from_values(self.subcategories.iter().map(String::as_str)),
        }
    }
}
