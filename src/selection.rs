// Filter selections and the value domains they choose from.
//
// The "All" option only exists at the input boundary: parsing turns it into
// `Selection::AllOf`, so no literal "All" ever reaches row matching.
use crate::types::ComplaintTable;
use serde::Serialize;
use std::collections::BTreeSet;

/// Inputs that mean "do not filter on this dimension".
pub const ALL_SENTINELS: &[&str] = &["All", "Все"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "values", rename_all = "snake_case")]
pub enum Selection<T: Ord> {
    AllOf,
    SubsetOf(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::AllOf
    }
}

impl<T: Ord + Clone> Selection<T> {
    pub fn subset<I: IntoIterator<Item = T>>(values: I) -> Self {
        Selection::SubsetOf(values.into_iter().collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::AllOf)
    }

    /// `AllOf` admits everything, nulls included. A subset never admits a null.
    pub fn admits(&self, value: Option<&T>) -> bool {
        match self {
            Selection::AllOf => true,
            Selection::SubsetOf(set) => value.is_some_and(|v| set.contains(v)),
        }
    }

    /// Concrete set of values chosen out of `domain`.
    pub fn expand(&self, domain: &BTreeSet<T>) -> BTreeSet<T> {
        match self {
            Selection::AllOf => domain.clone(),
            Selection::SubsetOf(set) => set.intersection(domain).cloned().collect(),
        }
    }
}

impl Selection<String> {
    /// Parse a `;`-separated list typed by the user.
    pub fn parse_list(input: &str) -> Self {
        Self::from_values(input.split(';'))
    }

    /// Build a selection from individual values. Empty input or any
    /// sentinel selects everything.
    pub fn from_values<'a, I: IntoIterator<Item = &'a str>>(values: I) -> Self {
        let mut set = BTreeSet::new();
        for v in values {
            let v = v.trim();
            if v.is_empty() {
                continue;
            }
            if is_sentinel(v) {
                return Selection::AllOf;
            }
            set.insert(v.to_string());
        }
        if set.is_empty() {
            Selection::AllOf
        } else {
            Selection::SubsetOf(set)
        }
    }
}

impl Selection<i32> {
    /// Parse a `,`-separated list of years. Tokens that are not years are
    /// returned as errors so the prompt can ask again.
    pub fn parse_years(input: &str) -> Result<Self, String> {
        let mut set = BTreeSet::new();
        for tok in input.split(',') {
            let tok = tok.trim();
            if tok.is_empty() {
                continue;
            }
            if is_sentinel(tok) {
                return Ok(Selection::AllOf);
            }
            let year = tok
                .parse::<i32>()
                .map_err(|_| format!("'{tok}' is not a year"))?;
            set.insert(year);
        }
        if set.is_empty() {
            Ok(Selection::AllOf)
        } else {
            Ok(Selection::SubsetOf(set))
        }
    }
}

fn is_sentinel(value: &str) -> bool {
    ALL_SENTINELS
        .iter()
        .any(|s| s.to_lowercase() == value.to_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub years: Selection<i32>,
    pub organizations: Selection<String>,
    pub categories: Selection<String>,
    pub subcategories: Selection<String>,
}

/// Distinct non-null values of each filter dimension in the unfiltered table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Domains {
    pub years: BTreeSet<i32>,
    pub organizations: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub subcategories: BTreeSet<String>,
}

impl Domains {
    pub fn from_table(table: &ComplaintTable) -> Self {
        let mut d = Domains::default();
        for r in table.records() {
            if let Some(y) = r.year() {
                d.years.insert(y);
            }
            if let Some(o) = &r.organization {
                d.organizations.insert(o.clone());
            }
            if let Some(c) = &r.category {
                d.categories.insert(c.clone());
            }
            if let Some(s) = &r.subcategory {
                d.subcategories.insert(s.clone());
            }
        }
        d
    }
}

/// A selection with every dimension expanded against the domains, echoed
/// back to the user and stored with the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSelection {
    pub years: BTreeSet<i32>,
    pub organizations: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub subcategories: BTreeSet<String>,
}

impl FilterSelection {
    pub fn resolve(&self, domains: &Domains) -> ResolvedSelection {
        ResolvedSelection {
            years: self.years.expand(&domains.years),
            organizations: self.organizations.expand(&domains.organizations),
            categories: self.categories.expand(&domains.categories),
            subcategories: self.subcategories.expand(&domains.subcategories),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_parses_to_all() {
        assert_eq!(Selection::<String>::parse_list("Все"), Selection::AllOf);
        assert_eq!(Selection::<String>::parse_list("ПОЛИКЛИНИКА №1; all"), Selection::AllOf);
        assert_eq!(Selection::<String>::parse_list("   "), Selection::AllOf);
    }

    #[test]
    fn test_parse_list_subset() {
        let sel = Selection::<String>::parse_list("Хирургия ; Терапия;");
        assert_eq!(
            sel,
            Selection::subset(["Терапия".to_string(), "Хирургия".to_string()])
        );
        assert!(!sel.is_all());
    }

    #[test]
    fn test_parse_years() {
        assert_eq!(
            Selection::<i32>::parse_years("2021, 2023").unwrap(),
            Selection::subset([2021, 2023])
        );
        assert_eq!(Selection::<i32>::parse_years("").unwrap(), Selection::AllOf);
        assert!(Selection::<i32>::parse_years("2021, twenty").is_err());
    }

    #[test]
    fn test_admits() {
        let all: Selection<String> = Selection::AllOf;
        assert!(all.admits(None));
        assert!(all.admits(Some(&"x".to_string())));

        let some = Selection::subset(["x".to_string()]);
        assert!(some.admits(Some(&"x".to_string())));
        assert!(!some.admits(Some(&"y".to_string())));
        assert!(!some.admits(None));
    }

    #[test]
    fn test_expand_to_domain() {
        let domain: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(Selection::<String>::AllOf.expand(&domain), domain);

        let sel = Selection::subset(["b".to_string(), "zzz".to_string()]);
        let expanded = sel.expand(&domain);
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains("b"));
    }
}
