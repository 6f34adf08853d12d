// Entry point and high-level CLI flow.
//
// - Option [1] loads and cleans both exports, printing diagnostics.
// - Option [2] asks for the year/organization/category/subcategory filters.
// - Option [3] renders every panel and exports them.
// With `--batch` the filters come from the command line and the dashboard
// is rendered once.
mod cli;
mod config;
mod error;
mod loader;
mod normalize;
mod output;
mod reports;
mod selection;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use loader::LoadReport;
use once_cell::unsync::OnceCell;
use reports::{Dashboard, Pipeline};
use selection::{Domains, FilterSelection, Selection};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;
use types::{ComplaintTable, MappingTable};

/// Everything read from disk. Built once, never mutated.
struct Dataset {
    complaints: ComplaintTable,
    report: LoadReport,
    mapping: MappingTable,
}

fn load_dataset(config: &Config) -> error::Result<Dataset> {
    let (complaints, report) = loader::load_complaints(&config.files.complaints, config)?;
    let mapping = loader::load_mapping(&config.files.mapping, config)?;
    Ok(Dataset {
        complaints,
        report,
        mapping,
    })
}

/// Per-process state: the data is loaded at most once, filters change on
/// every interaction.
struct Session {
    config: Config,
    dataset: OnceCell<Dataset>,
    selection: FilterSelection,
}

impl Session {
    fn new(config: Config) -> Self {
        Self {
            config,
            dataset: OnceCell::new(),
            selection: FilterSelection::default(),
        }
    }

    /// Load on first call, return the cached dataset afterwards.
    fn dataset(&self) -> error::Result<&Dataset> {
        self.dataset.get_or_try_init(|| load_dataset(&self.config))
    }

    fn is_loaded(&self) -> bool {
        self.dataset.get().is_some()
    }

    fn pipeline<'a>(&'a self, dataset: &'a Dataset) -> Pipeline<'a> {
        Pipeline::new(&dataset.complaints, &dataset.mapping, &self.config.views)
    }
}

/// Print a prompt and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn print_load_report(dataset: &Dataset) {
    let r = &dataset.report;
    println!(
        "Processing dataset... ({} rows loaded)",
        util::format_int(r.loaded_rows)
    );
    if r.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to malformed records.",
            util::format_int(r.parse_errors)
        );
    }
    if r.unparsed_dates > 0 {
        println!(
            "Note: {} rows have no readable submission date and are left out of year/month panels.",
            util::format_int(r.unparsed_dates)
        );
    }
    if !r.has_organization {
        println!("Info: no organization column; organization filter disabled.");
    }
    if dataset.mapping.is_empty() {
        println!("Info: no 4P mapping loaded; principle panels will show no data.");
    } else {
        println!(
            "4P mapping: {} rows.",
            util::format_int(dataset.mapping.rows.len())
        );
    }
    println!();
}

/// Handle option [1]: load both exports once.
fn handle_load(session: &Session) {
    if session.is_loaded() {
        println!("Data already loaded; reusing it.\n");
        return;
    }
    match session.dataset() {
        Ok(dataset) => print_load_report(dataset),
        Err(e) => {
            error!("load failed: {}", e);
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn print_options<T: Display>(label: &str, values: &BTreeSet<T>) {
    let shown: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    println!("{} ({}): {}", label, shown.len(), shown.join("; "));
}

fn ask_years(domains: &Domains) -> Option<Selection<i32>> {
    print_options("Years", &domains.years);
    loop {
        let input = prompt("Select year(s), comma-separated [All]: ")?;
        match Selection::<i32>::parse_years(&input) {
            Ok(sel) => return Some(sel),
            Err(msg) => println!("Invalid input: {}", msg),
        }
    }
}

fn ask_values(label: &str, values: &BTreeSet<String>) -> Option<Selection<String>> {
    print_options(label, values);
    let input = prompt(&format!("Select {}, ';'-separated [All]: ", label.to_lowercase()))?;
    Some(Selection::<String>::parse_list(&input))
}

/// Handle option [2]: ask for every filter, starting from "All".
fn handle_set_filters(session: &mut Session) -> Option<()> {
    let Some(dataset) = session.dataset.get() else {
        println!("Error: No data loaded. Please load the files first (option 1).\n");
        return Some(());
    };
    let domains = Domains::from_table(&dataset.complaints);
    let has_org = dataset.complaints.schema().has_organization();

    let mut sel = FilterSelection {
        years: ask_years(&domains)?,
        ..FilterSelection::default()
    };
    if has_org {
        sel.organizations = ask_values("Organizations", &domains.organizations)?;
    }
    sel.categories = ask_values("Categories", &domains.categories)?;
    sel.subcategories = ask_values("Subcategories", &domains.subcategories)?;

    debug!(?sel, "filters updated");
    session.selection = sel;
    println!();
    Some(())
}

fn describe<T: Display>(label: &str, values: &BTreeSet<T>, domain: &BTreeSet<T>) {
    if values.len() == domain.len() {
        println!("  {}: All", label);
    } else {
        let shown: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        println!("  {}: {}", label, shown.join("; "));
    }
}

fn render_and_export(session: &Session, dataset: &Dataset, out_dir: &Path) -> error::Result<()> {
    let pipeline = session.pipeline(dataset);
    let dash: Dashboard = pipeline.render(&session.selection);
    let domains = pipeline.domains();

    println!("Filters:");
    describe("Years", &dash.selection.years, &domains.years);
    if dataset.complaints.schema().has_organization() {
        describe(
            "Organizations",
            &dash.selection.organizations,
            &domains.organizations,
        );
    }
    describe("Categories", &dash.selection.categories, &domains.categories);
    describe(
        "Subcategories",
        &dash.selection.subcategories,
        &domains.subcategories,
    );
    println!();

    output::print_dashboard(&dash, session.config.output.preview_rows);
    let written = output::export_dashboard(out_dir, &dash)?;
    println!(
        "(Panels exported to {}: {} files)\n",
        out_dir.display(),
        written.len()
    );
    Ok(())
}

/// Handle option [3]: render and export the dashboard.
fn handle_generate(session: &Session) {
    let Some(dataset) = session.dataset.get() else {
        println!("Error: No data loaded. Please load the files first (option 1).\n");
        return;
    };
    if let Err(e) = render_and_export(session, dataset, &session.config.output.dir) {
        error!("export failed: {}", e);
        eprintln!("Write error: {}\n", e);
    }
}

fn run_interactive(session: &mut Session) {
    loop {
        println!("Patient Feedback Dashboard");
        println!("[1] Load the files");
        println!("[2] Set filters");
        println!("[3] Generate dashboard");
        println!("[4] Exit\n");
        let Some(choice) = prompt("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(session),
            "2" => {
                if handle_set_filters(session).is_none() {
                    break;
                }
            }
            "3" => handle_generate(session),
            "4" => break,
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
    println!("Exiting the program.");
}

fn run_batch(session: &mut Session, selection: FilterSelection) -> Result<()> {
    let dataset = session
        .dataset()
        .context("failed to load dashboard data")?;
    print_load_report(dataset);
    session.selection = selection;
    let dataset = session
        .dataset
        .get()
        .context("dataset missing after load")?;
    render_and_export(session, dataset, &session.config.output.dir)
        .context("failed to export dashboard")?;
    Ok(())
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;
    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.init_config {
        return handle_init_config();
    }
    init_logging(&args)?;
    info!("pos_dashboard v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        Config::discover(args.config.as_deref()).context("failed to load configuration")?;
    config.merge_with_args(&args);
    debug!(?config, "configuration resolved");

    let mut session = Session::new(config);
    if args.batch {
        return run_batch(&mut session, args.filter_selection());
    }
    run_interactive(&mut session);
    Ok(())
}
