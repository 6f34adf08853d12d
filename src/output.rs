use crate::error::{DashboardError, Result};
use crate::reports::Dashboard;
use crate::types::MappingView;
use crate::util::format_int;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let csv_err = |source: csv::Error| DashboardError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for r in rows {
        wtr.serialize(r).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn preview_panel<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows", format_int(rows.len() - max_rows));
    }
    println!();
}

fn preview_mapping_panel<T>(title: &str, view: &MappingView<T>, no_data: &str, max_rows: usize)
where
    T: Tabled + Clone,
{
    match view {
        MappingView::NoData => println!("{}\n\n{}\n", title, no_data),
        MappingView::Rows(rows) => preview_panel(title, rows, max_rows),
    }
}

/// Print every panel of the dashboard to the console.
pub fn print_dashboard(dash: &Dashboard, max_rows: usize) {
    println!(
        "Complaints matching filters: {}\n",
        format_int(dash.filtered_rows)
    );
    preview_panel("Top-10 complaint facts by year", &dash.fact_trend, max_rows);
    preview_panel("Seasonality by month", &dash.monthly_seasonality, max_rows);
    preview_panel("Trend by category", &dash.category_trend, max_rows);
    preview_panel("Trend by subcategory", &dash.subcategory_trend, max_rows);
    preview_mapping_panel(
        "Complaints per 4P principle",
        &dash.principle_counts,
        "No data for 4P principles",
        max_rows,
    );
    preview_mapping_panel(
        "Most frequent fact / 4P criterion combinations",
        &dash.top_combinations,
        "No data for 4P criterion combinations",
        max_rows,
    );
    if let Some(rows) = &dash.organization_year {
        preview_panel("Complaints by year and organization", rows, max_rows);
    }
}

fn export_panel<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: &[T],
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    let path = dir.join(name);
    write_csv(&path, rows)?;
    written.push(path);
    Ok(())
}

/// Export one CSV per panel plus the whole dashboard as JSON. Returns the
/// files written.
pub fn export_dashboard(dir: &Path, dash: &Dashboard) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| DashboardError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();

    export_panel(dir, "fact_trend.csv", &dash.fact_trend, &mut written)?;
    export_panel(dir, "monthly_seasonality.csv", &dash.monthly_seasonality, &mut written)?;
    export_panel(dir, "category_trend.csv", &dash.category_trend, &mut written)?;
    export_panel(dir, "subcategory_trend.csv", &dash.subcategory_trend, &mut written)?;
    if let Some(rows) = &dash.organization_year {
        export_panel(dir, "organization_year.csv", rows, &mut written)?;
    }
    if let Some(rows) = dash.principle_counts.rows() {
        export_panel(dir, "principle_counts.csv", rows, &mut written)?;
    }
    if let Some(rows) = dash.top_combinations.rows() {
        export_panel(dir, "top_combinations.csv", rows, &mut written)?;
    }

    let json_path = dir.join("dashboard.json");
    write_json(&json_path, dash)?;
    written.push(json_path);

    info!(dir = %dir.display(), files = written.len(), "dashboard exported");
    Ok(written)
}
