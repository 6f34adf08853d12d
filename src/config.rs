//! Configuration file handling.
//!
//! Everything the dashboard treats as a constant (file names, column
//! headers, the organization phrase catalog, excluded facts) lives here so
//! a different export can be handled without touching the code.

use crate::cli::Args;
use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pos_dashboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub files: FilesConfig,

    #[serde(default)]
    pub columns: ColumnsConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub views: ViewsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Input file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Primary complaints export. Required at startup.
    #[serde(default = "default_complaints")]
    pub complaints: PathBuf,

    /// Fact to 4P principle mapping. Optional.
    #[serde(default = "default_mapping")]
    pub mapping: PathBuf,

    /// Field delimiter used by both exports.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            complaints: default_complaints(),
            mapping: default_mapping(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_complaints() -> PathBuf {
    PathBuf::from("Отчет_ПОС_кратко.csv")
}

fn default_mapping() -> PathBuf {
    PathBuf::from("Факты_и_критерии_4П.csv")
}

fn default_delimiter() -> char {
    ','
}

/// Column headers of the two exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_submitted")]
    pub submitted: String,
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_subcategory")]
    pub subcategory: String,
    /// Shared by both tables; this is the join key.
    #[serde(default = "default_fact")]
    pub fact: String,
    #[serde(default = "default_principle")]
    pub principle: String,
    #[serde(default = "default_criterion")]
    pub criterion: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            submitted: default_submitted(),
            organization: default_organization(),
            category: default_category(),
            subcategory: default_subcategory(),
            fact: default_fact(),
            principle: default_principle(),
            criterion: default_criterion(),
        }
    }
}

fn default_submitted() -> String {
    "Дата поступления".to_string()
}
fn default_organization() -> String {
    "Организация исполнителя".to_string()
}
fn default_category() -> String {
    "Категория".to_string()
}
fn default_subcategory() -> String {
    "Подкатегория".to_string()
}
fn default_fact() -> String {
    "Факт".to_string()
}
fn default_principle() -> String {
    "Принцип 4П".to_string()
}
fn default_criterion() -> String {
    "Критерии".to_string()
}

/// Organization name cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Literal phrases removed from organization names, applied in order.
    #[serde(default = "default_remove_phrases")]
    pub remove_phrases: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            remove_phrases: default_remove_phrases(),
        }
    }
}

fn default_remove_phrases() -> Vec<String> {
    vec![
        "ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ ЛЕНИНГРАДСКОЙ ОБЛАСТИ",
        "ГОСУДАРСТВЕННОЕ КАЗЕННОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ ЛЕНИНГРАДСКОЙ ОБЛАСТИ",
        "ОБЩЕСТВО С ОГРАНИЧЕННОЙ ОТВЕТСТВЕННОСТЬЮ",
        "ЧАСТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ",
        "ЛЕНИНГРАДСКОЕ ОБЛАСТНОЕ ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ",
        "АДМИНИСТРАЦИЯ МУНИЦИПАЛЬНОГО ОБРАЗОВАНИЯ",
        "ФЕДЕРАЛЬНОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ НАУКИ",
        "ФЕДЕРАЛЬНОЕ ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ",
        "ГОСУДАРСТВЕННОЕ КАЗЕННОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ",
        "ЛЕНИНГРАДСКОЕ ОБЛАСТНОЕ ГОСУДАРСТВЕННОЕ ПРЕДПРИЯТИЕ",
        "ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ",
        "ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ ПРОФЕССИОНАЛЬНОЕ ОБРАЗОВАТЕЛЬНОЕ УЧРЕЖДЕНИЕ",
        "ГОСУДАРСТВЕННОЕ АВТОНОМНОЕ УЧРЕЖДЕНИЕ ЛЕНИНГРАДСКОЙ ОБЛАСТИ",
        "ГОСУДАРСТВЕННОЕ АВТОНОМНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ ЛЕНИНГРАДСКОЙ ОБЛАСТИ",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Aggregate view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Placeholder facts that say nothing about the actual problem.
    #[serde(default = "default_excluded_facts")]
    pub excluded_facts: Vec<String>,

    /// Number of facts in the fact trend panel.
    #[serde(default = "default_top_facts")]
    pub top_facts: usize,

    /// Number of rows in the fact/criterion/principle panel.
    #[serde(default = "default_top_combinations")]
    pub top_combinations: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            excluded_facts: default_excluded_facts(),
            top_facts: default_top_facts(),
            top_combinations: default_top_combinations(),
        }
    }
}

fn default_excluded_facts() -> Vec<String> {
    vec!["-", "Иное", "Другое", "Other"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_top_facts() -> usize {
    10
}

fn default_top_combinations() -> usize {
    20
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the per-panel CSV files and `dashboard.json`.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Rows shown per panel in the console preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dashboard_out")
}

fn default_preview_rows() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DashboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| DashboardError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config for this run: an explicit `--config` must exist,
    /// otherwise the working-directory file is used when present.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            Self::load(local)
        } else {
            Ok(Self::default())
        }
    }

    /// Command-line flags win over file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(path) = &args.complaints {
            self.files.complaints = path.clone();
        }
        if let Some(path) = &args.mapping {
            self.files.mapping = path.clone();
        }
        if let Some(dir) = &args.out {
            self.output.dir = dir.clone();
        }
    }

    /// Render the default configuration as TOML.
    pub fn default_toml() -> String {
        let header = "# pos_dashboard configuration\n\n";
        match toml::to_string_pretty(&Self::default()) {
            Ok(body) => format!("{header}{body}"),
            Err(_) => header.to_string(),
        }
    }
}
