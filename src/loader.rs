use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::normalize::OrgNormalizer;
use crate::types::{ComplaintRecord, ComplaintTable, MappingTable, PrincipleMapping, Schema};
use crate::util::{clean_cell, parse_date_dayfirst};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub unparsed_dates: usize,
    pub has_organization: bool,
}

fn open_reader(path: &Path, delimiter: char) -> Result<csv::Reader<std::fs::File>> {
    if !delimiter.is_ascii() {
        return Err(DashboardError::InvalidDelimiter(delimiter));
    }
    ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_path(path)
        .map_err(|source| DashboardError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn read_headers(rdr: &mut csv::Reader<std::fs::File>, path: &Path) -> Result<Vec<String>> {
    let headers = rdr.headers().map_err(|source| DashboardError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect())
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name.trim())
}

fn require_column(headers: &[String], name: &str, path: &Path) -> Result<usize> {
    find_column(headers, name).ok_or_else(|| DashboardError::MissingColumn {
        column: name.to_string(),
        path: path.to_path_buf(),
    })
}

fn cell(record: &StringRecord, idx: usize) -> Option<String> {
    clean_cell(record.get(idx))
}

/// Resolve header positions for the complaints export. The organization
/// column is the only optional one.
pub fn resolve_schema(headers: &[String], config: &Config, path: &Path) -> Result<Schema> {
    let cols = &config.columns;
    Ok(Schema {
        submitted: require_column(headers, &cols.submitted, path)?,
        category: require_column(headers, &cols.category, path)?,
        subcategory: require_column(headers, &cols.subcategory, path)?,
        fact: require_column(headers, &cols.fact, path)?,
        organization: find_column(headers, &cols.organization),
    })
}

/// Read the complaints export, parse dates day-first and clean up
/// organization names.
///
/// A missing file or a missing required column is fatal. Bad dates are not:
/// they become null and are counted in the report.
pub fn load_complaints(path: &Path, config: &Config) -> Result<(ComplaintTable, LoadReport)> {
    if !path.exists() {
        return Err(DashboardError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }
    let mut rdr = open_reader(path, config.files.delimiter)?;
    let headers = read_headers(&mut rdr, path)?;
    let schema = resolve_schema(&headers, config, path)?;
    if !schema.has_organization() {
        warn!(
            column = %config.columns.organization,
            "organization column missing; organization filter and panel disabled"
        );
    }
    let normalizer = OrgNormalizer::new(&config.normalize.remove_phrases);

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut unparsed_dates = 0usize;
    let mut records: Vec<ComplaintRecord> = Vec::new();

    for result in rdr.records() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = total_rows, error = %e, "skipping malformed record");
                parse_errors += 1;
                continue;
            }
        };

        let raw_date = row.get(schema.submitted);
        let submitted = parse_date_dayfirst(raw_date);
        if submitted.is_none() {
            unparsed_dates += 1;
        }

        let organization = schema
            .organization
            .and_then(|idx| row.get(idx))
            .map(|raw| normalizer.normalize(raw))
            .filter(|name| !name.is_empty());

        records.push(ComplaintRecord::new(
            submitted,
            organization,
            cell(&row, schema.category),
            cell(&row, schema.subcategory),
            cell(&row, schema.fact),
        ));
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: records.len(),
        parse_errors,
        unparsed_dates,
        has_organization: schema.has_organization(),
    };
    info!(
        path = %path.display(),
        rows = report.loaded_rows,
        parse_errors,
        unparsed_dates,
        "complaints loaded"
    );
    Ok((ComplaintTable::new(schema, records), report))
}

/// Read the fact to principle mapping. A missing file is not an error: the
/// principle panels report "no data" instead.
pub fn load_mapping(path: &Path, config: &Config) -> Result<MappingTable> {
    if !path.exists() {
        warn!(path = %path.display(), "mapping file not found; 4P panels will show no data");
        return Ok(MappingTable::default());
    }
    let mut rdr = open_reader(path, config.files.delimiter)?;
    let headers = read_headers(&mut rdr, path)?;
    let cols = &config.columns;
    let principle_idx = require_column(&headers, &cols.principle, path)?;
    let fact_idx = require_column(&headers, &cols.fact, path)?;
    let criterion_idx = require_column(&headers, &cols.criterion, path)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let Ok(row) = result else {
            skipped += 1;
            continue;
        };
        let Some(fact) = cell(&row, fact_idx) else {
            skipped += 1;
            continue;
        };
        rows.push(PrincipleMapping {
            principle: cell(&row, principle_idx),
            fact,
            criterion: cell(&row, criterion_idx),
        });
    }
    info!(path = %path.display(), rows = rows.len(), skipped, "mapping loaded");
    Ok(MappingTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_complaints_derives_dates_and_cleans_orgs() {
        let file = write_csv(
            "\u{feff}Дата поступления,Организация исполнителя,Категория,Подкатегория,Факт\n\
             15.03.2021,ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ ЛЕНИНГРАДСКОЙ ОБЛАСТИ ПОЛИКЛИНИКА №1,Качество,Врачи,Грубость\n\
             неизвестно,ЦРБ,Качество,,Очереди\n",
        );
        let (table, report) = load_complaints(file.path(), &Config::default()).unwrap();

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(report.unparsed_dates, 1);
        assert!(report.has_organization);

        let first = &table.records()[0];
        assert_eq!(first.submitted(), NaiveDate::from_ymd_opt(2021, 3, 15));
        assert_eq!(first.year(), Some(2021));
        assert_eq!(first.month(), Some(3));
        assert_eq!(first.organization.as_deref(), Some("ПОЛИКЛИНИКА №1"));

        let second = &table.records()[1];
        assert_eq!(second.submitted(), None);
        assert_eq!(second.year(), None);
        assert_eq!(second.month(), None);
        assert_eq!(second.subcategory, None);
        assert_eq!(second.fact.as_deref(), Some("Очереди"));
    }

    #[test]
    fn test_load_complaints_without_org_column() {
        let file = write_csv(
            "Дата поступления,Категория,Подкатегория,Факт\n01.02.2022,К,П,Ф\n",
        );
        let (table, report) = load_complaints(file.path(), &Config::default()).unwrap();
        assert!(!report.has_organization);
        assert!(!table.schema().has_organization());
        assert_eq!(table.records()[0].organization, None);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let file = write_csv("Дата поступления,Категория,Факт\n01.02.2022,К,Ф\n");
        let err = load_complaints(file.path(), &Config::default()).unwrap_err();
        match err {
            DashboardError::MissingColumn { column, .. } => assert_eq!(column, "Подкатегория"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_complaints_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_complaints(&dir.path().join("absent.csv"), &Config::default());
        assert!(matches!(result, Err(DashboardError::Io { .. })));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let file = write_csv("Дата поступления;Категория;Подкатегория;Факт\n01.02.2022;К, Л;П;Ф\n");
        let mut config = Config::default();
        config.files.delimiter = ';';
        let (table, _) = load_complaints(file.path(), &config).unwrap();
        assert_eq!(table.records()[0].category.as_deref(), Some("К, Л"));
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        let file = write_csv("Дата поступления,Категория,Подкатегория,Факт\n01.02.2022,К,П,Ф\n");
        let mut config = Config::default();
        config.files.delimiter = 'é';
        let err = load_complaints(file.path(), &config).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidDelimiter('é')));

        config.files.delimiter = '¦';
        assert!(matches!(
            load_mapping(file.path(), &config),
            Err(DashboardError::InvalidDelimiter('¦'))
        ));
    }

    #[test]
    fn test_load_mapping() {
        let file = write_csv(
            "Принцип 4П,Факт,Критерии\n\
             Пациент,Грубость,Вежливость персонала\n\
             Процесс,,Без факта\n\
             Процесс,Очереди,Время ожидания\n",
        );
        let mapping = load_mapping(file.path(), &Config::default()).unwrap();
        assert_eq!(mapping.rows.len(), 2);
        assert_eq!(mapping.rows[0].fact, "Грубость");
        assert_eq!(mapping.rows[1].criterion.as_deref(), Some("Время ожидания"));
    }

    #[test]
    fn test_missing_mapping_file_gives_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = load_mapping(&dir.path().join("absent.csv"), &Config::default()).unwrap();
        assert!(mapping.is_empty());
    }
}
