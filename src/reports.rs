use crate::config::ViewsConfig;
use crate::selection::{Domains, FilterSelection, ResolvedSelection};
use crate::types::{
    CategoryTrendRow, CombinationRow, ComplaintRecord, ComplaintTable, FactTrendRow,
    MappingTable, MappingView, MonthCountRow, OrgYearRow, PrincipleCountRow, PrincipleMapping,
    SubcategoryTrendRow,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Every panel of one render, computed from the same filtered rows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub selection: ResolvedSelection,
    pub filtered_rows: usize,
    pub fact_trend: Vec<FactTrendRow>,
    pub monthly_seasonality: Vec<MonthCountRow>,
    pub category_trend: Vec<CategoryTrendRow>,
    pub subcategory_trend: Vec<SubcategoryTrendRow>,
    /// `None` when the export has no organization column.
    pub organization_year: Option<Vec<OrgYearRow>>,
    pub principle_counts: MappingView<PrincipleCountRow>,
    pub top_combinations: MappingView<CombinationRow>,
}

/// Filter and aggregate over a loaded table. Holds only borrows, so a
/// render never touches the cached data.
pub struct Pipeline<'a> {
    table: &'a ComplaintTable,
    mapping: &'a MappingTable,
    views: &'a ViewsConfig,
    domains: Domains,
}

impl<'a> Pipeline<'a> {
    pub fn new(table: &'a ComplaintTable, mapping: &'a MappingTable, views: &'a ViewsConfig) -> Self {
        Self {
            table,
            mapping,
            views,
            domains: Domains::from_table(table),
        }
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Rows passing the year, organization, category and subcategory
    /// filters, in table order. Each step only narrows the previous one.
    pub fn filter(&self, sel: &FilterSelection) -> Vec<&'a ComplaintRecord> {
        let mut rows: Vec<&'a ComplaintRecord> = self
            .table
            .records()
            .iter()
            .filter(|r| r.year().is_some() && sel.years.admits(r.year().as_ref()))
            .collect();

        if self.table.schema().has_organization() && !sel.organizations.is_all() {
            rows.retain(|r| sel.organizations.admits(r.organization.as_ref()));
        }
        if !sel.categories.is_all() {
            rows.retain(|r| sel.categories.admits(r.category.as_ref()));
        }
        if !sel.subcategories.is_all() {
            rows.retain(|r| sel.subcategories.admits(r.subcategory.as_ref()));
        }
        rows
    }

    pub fn render(&self, sel: &FilterSelection) -> Dashboard {
        let rows = self.filter(sel);
        debug!(filtered = rows.len(), total = self.table.len(), "filters applied");

        let organization_year = if self.table.schema().has_organization() {
            Some(organization_year(&rows))
        } else {
            None
        };
        let (principle_counts, top_combinations) = if self.mapping.is_empty() {
            (MappingView::NoData, MappingView::NoData)
        } else {
            let joined = join_mapping(&rows, self.mapping);
            (
                MappingView::Rows(principle_counts(&joined)),
                MappingView::Rows(top_combinations(&joined, self.views.top_combinations)),
            )
        };

        Dashboard {
            selection: sel.resolve(&self.domains),
            filtered_rows: rows.len(),
            fact_trend: fact_trend(&rows, &self.views.excluded_facts, self.views.top_facts),
            monthly_seasonality: monthly_seasonality(&rows),
            category_trend: category_trend(&rows),
            subcategory_trend: subcategory_trend(&rows),
            organization_year,
            principle_counts,
            top_combinations,
        }
    }
}

/// Count rows per `(year, key)`, skipping rows where either is null.
fn count_by_year<'r, F>(rows: &[&'r ComplaintRecord], key: F) -> BTreeMap<(i32, String), usize>
where
    F: Fn(&'r ComplaintRecord) -> Option<&'r String>,
{
    let mut map: BTreeMap<(i32, String), usize> = BTreeMap::new();
    for &r in rows {
        if let (Some(year), Some(k)) = (r.year(), key(r)) {
            *map.entry((year, k.clone())).or_default() += 1;
        }
    }
    map
}

/// Most frequent facts, placeholders excluded. Ties go to the
/// lexicographically smaller fact.
pub fn top_facts(rows: &[&ComplaintRecord], excluded: &[String], n: usize) -> Vec<String> {
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in rows {
        if let Some(fact) = r.fact.as_deref() {
            if !excluded.contains(fact) {
                *counts.entry(fact).or_default() += 1;
            }
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // Stable sort keeps the BTreeMap's alphabetical order for equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(n).map(|(f, _)| f.to_string()).collect()
}

pub fn fact_trend(rows: &[&ComplaintRecord], excluded: &[String], n: usize) -> Vec<FactTrendRow> {
    let top: HashSet<String> = top_facts(rows, excluded, n).into_iter().collect();
    count_by_year(rows, |r| r.fact.as_ref().filter(|f| top.contains(*f)))
        .into_iter()
        .map(|((year, fact), count)| FactTrendRow { year, fact, count })
        .collect()
}

pub fn monthly_seasonality(rows: &[&ComplaintRecord]) -> Vec<MonthCountRow> {
    let mut map: BTreeMap<u32, usize> = BTreeMap::new();
    for r in rows {
        if let Some(month) = r.month() {
            *map.entry(month).or_default() += 1;
        }
    }
    map.into_iter()
        .map(|(month, count)| MonthCountRow { month, count })
        .collect()
}

pub fn category_trend(rows: &[&ComplaintRecord]) -> Vec<CategoryTrendRow> {
    count_by_year(rows, |r| r.category.as_ref())
        .into_iter()
        .map(|((year, category), count)| CategoryTrendRow { year, category, count })
        .collect()
}

pub fn subcategory_trend(rows: &[&ComplaintRecord]) -> Vec<SubcategoryTrendRow> {
    count_by_year(rows, |r| r.subcategory.as_ref())
        .into_iter()
        .map(|((year, subcategory), count)| SubcategoryTrendRow {
            year,
            subcategory,
            count,
        })
        .collect()
}

pub fn organization_year(rows: &[&ComplaintRecord]) -> Vec<OrgYearRow> {
    count_by_year(rows, |r| r.organization.as_ref())
        .into_iter()
        .map(|((year, organization), count)| OrgYearRow {
            year,
            organization,
            count,
        })
        .collect()
}

/// Inner join on fact: one output entry per (complaint, mapping row) pair.
/// Complaints with an unmapped fact drop out here and only here.
pub fn join_mapping<'m>(
    rows: &[&ComplaintRecord],
    mapping: &'m MappingTable,
) -> Vec<&'m PrincipleMapping> {
    let mut by_fact: HashMap<&str, Vec<&'m PrincipleMapping>> = HashMap::new();
    for m in &mapping.rows {
        by_fact.entry(m.fact.as_str()).or_default().push(m);
    }
    rows.iter()
        .filter_map(|r| r.fact.as_deref())
        .filter_map(|fact| by_fact.get(fact))
        .flat_map(|matches| matches.iter().copied())
        .collect()
}

/// Complaints per principle, most frequent first.
pub fn principle_counts(joined: &[&PrincipleMapping]) -> Vec<PrincipleCountRow> {
    let mut map: BTreeMap<&str, usize> = BTreeMap::new();
    for m in joined {
        if let Some(p) = m.principle.as_deref() {
            *map.entry(p).or_default() += 1;
        }
    }
    let mut rows: Vec<PrincipleCountRow> = map
        .into_iter()
        .map(|(principle, count)| PrincipleCountRow {
            principle: principle.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Most frequent (fact, criterion, principle) triples. Equal counts keep
/// the key order.
pub fn top_combinations(joined: &[&PrincipleMapping], n: usize) -> Vec<CombinationRow> {
    let mut map: BTreeMap<(&str, &str, &str), usize> = BTreeMap::new();
    for m in joined {
        if let (Some(criterion), Some(principle)) = (m.criterion.as_deref(), m.principle.as_deref()) {
            *map.entry((m.fact.as_str(), criterion, principle)).or_default() += 1;
        }
    }
    let mut rows: Vec<CombinationRow> = map
        .into_iter()
        .map(|((fact, criterion, principle), count)| CombinationRow {
            fact: fact.to_string(),
            criterion: criterion.to_string(),
            principle: principle.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows.truncate(n);
    rows
}
