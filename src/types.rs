use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tabled::Tabled;

/// Header positions resolved once when the complaints export is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub submitted: usize,
    pub category: usize,
    pub subcategory: usize,
    pub fact: usize,
    pub organization: Option<usize>,
}

impl Schema {
    pub fn has_organization(&self) -> bool {
        self.organization.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRecord {
    submitted: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u32>,
    pub organization: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub fact: Option<String>,
}

impl ComplaintRecord {
    /// Year and month are always derived here, never set independently.
    pub fn new(
        submitted: Option<NaiveDate>,
        organization: Option<String>,
        category: Option<String>,
        subcategory: Option<String>,
        fact: Option<String>,
    ) -> Self {
        Self {
            submitted,
            year: submitted.map(|d| d.year()),
            month: submitted.map(|d| d.month()),
            organization,
            category,
            subcategory,
            fact,
        }
    }

    pub fn submitted(&self) -> Option<NaiveDate> {
        self.submitted
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }
}

/// The loaded complaints export. Immutable once built.
#[derive(Debug, Clone)]
pub struct ComplaintTable {
    schema: Schema,
    records: Vec<ComplaintRecord>,
}

impl ComplaintTable {
    pub fn new(schema: Schema, records: Vec<ComplaintRecord>) -> Self {
        Self { schema, records }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[ComplaintRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// One row of the fact to 4P principle mapping. Rows without a fact are
/// dropped at load since they can never join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipleMapping {
    pub principle: Option<String>,
    pub fact: String,
    pub criterion: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    pub rows: Vec<PrincipleMapping>,
}

impl MappingTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct FactTrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Fact")]
    #[tabled(rename = "Fact")]
    pub fact: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct MonthCountRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Complaints")]
    #[tabled(rename = "Complaints")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct CategoryTrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct SubcategoryTrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Subcategory")]
    #[tabled(rename = "Subcategory")]
    pub subcategory: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct OrgYearRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Organization")]
    #[tabled(rename = "Organization")]
    pub organization: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct PrincipleCountRow {
    #[serde(rename = "Principle")]
    #[tabled(rename = "Principle")]
    pub principle: String,
    #[serde(rename = "Complaints")]
    #[tabled(rename = "Complaints")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct CombinationRow {
    #[serde(rename = "Fact")]
    #[tabled(rename = "Fact")]
    pub fact: String,
    #[serde(rename = "Criterion")]
    #[tabled(rename = "Criterion")]
    pub criterion: String,
    #[serde(rename = "Principle")]
    #[tabled(rename = "Principle")]
    pub principle: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Result of a view that depends on the principle mapping.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum MappingView<T> {
    /// No mapping table was available; the panel shows a message instead.
    NoData,
    Rows(Vec<T>),
}

impl<T> MappingView<T> {
    pub fn rows(&self) -> Option<&[T]> {
        match self {
            MappingView::NoData => None,
            MappingView::Rows(rows) => Some(rows.as_slice()),
        }
    }
}
