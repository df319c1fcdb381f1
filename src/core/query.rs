//! Record filtering, ordering and paging shared by the claims, reports and
//! map views.
//!
//! Everything here is infallible: malformed input narrows the result set or
//! falls back to a neutral ordering instead of producing an error.

use crate::domain::model::{value_text, ChartDatum, Page, Record};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Case-insensitive substring search spanning several fields. An active term
/// with no fields matches nothing; configs reject that combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSearch {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl TextSearch {
    pub fn new(term: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            term: term.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.term.is_empty()
    }

    /// True when the term is set but no field would be searched.
    pub fn is_unsearchable(&self) -> bool {
        self.is_active() && self.fields.iter().all(|f| f.trim().is_empty())
    }

    pub fn matches(&self, record: &Record) -> bool {
        if !self.is_active() {
            return true;
        }
        let needle = self.term.to_lowercase();
        self.fields.iter().any(|field| {
            record
                .field_text(field)
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        })
    }
}

/// "Last N days" window ending at `reference`, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateWindow {
    pub field: String,
    pub days: u32,
    pub reference: NaiveDate,
}

impl DateWindow {
    pub fn matches(&self, record: &Record) -> bool {
        let Some(text) = record.field_text(&self.field) else {
            return false;
        };
        // tolerate full timestamps by reading only the calendar part
        let day = text.get(..10).unwrap_or(&text);
        let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
            return false;
        };
        let start = self
            .reference
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN);
        date >= start && date <= self.reference
    }
}

/// Active filter configuration. Empty values place no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub exact: BTreeMap<String, String>,
    #[serde(default)]
    pub search: Option<TextSearch>,
    #[serde(default)]
    pub date_window: Option<DateWindow>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exact(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn with_search(mut self, search: TextSearch) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_date_window(mut self, window: DateWindow) -> Self {
        self.date_window = Some(window);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.exact.insert(field.to_string(), value.into());
    }

    pub fn is_active(&self) -> bool {
        self.exact.values().any(|v| !v.is_empty())
            || self.search.as_ref().is_some_and(TextSearch::is_active)
            || self.date_window.is_some()
    }

    /// Resets every constraint while keeping the known filter keys.
    pub fn clear(&mut self) {
        self.exact.values_mut().for_each(String::clear);
        if let Some(search) = self.search.as_mut() {
            search.term.clear();
        }
        self.date_window = None;
    }

    pub fn matches(&self, record: &Record) -> bool {
        let exact_ok = self
            .exact
            .iter()
            .filter(|(_, wanted)| !wanted.is_empty())
            .all(|(field, wanted)| record.field_text(field).as_deref() == Some(wanted.as_str()));

        exact_ok
            && self.search.as_ref().map_or(true, |s| s.matches(record))
            && self.date_window.as_ref().map_or(true, |w| w.matches(record))
    }

    pub fn filter(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortDirection::Ascending),
            "descending" | "desc" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Descending,
        }
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ord = compare_values(a.field(&self.key), b.field(&self.key));
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }

    /// Stable: equal keys keep their input order in both directions.
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

/// Parses the `key,direction` form used by sort selectors, e.g. `date,descending`.
impl FromStr for SortSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (key, direction) = match s.split_once(',') {
            Some((key, direction)) => (key.trim(), direction.parse()?),
            None => (s.trim(), SortDirection::Ascending),
        };
        if key.is_empty() {
            return Err("sort key cannot be empty".to_string());
        }
        Ok(Self {
            key: key.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        };
        write!(f, "{},{}", self.key, direction)
    }
}

/// Numbers compare numerically, everything else by its text form; a missing
/// value sorts before any present one.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}

/// Zero-based page window. `size == 0` returns everything as a single page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub size: usize,
}

impl PageRequest {
    pub fn new(index: usize, size: usize) -> Self {
        Self { index, size }
    }

    pub fn slice(&self, records: Vec<Record>) -> Page {
        let total_items = records.len();
        let total_pages = match (self.size, total_items) {
            (_, 0) => 0,
            (0, _) => 1,
            (size, total) => total.div_ceil(size),
        };

        let items = if self.index >= total_pages {
            Vec::new()
        } else if self.size == 0 {
            records
        } else {
            records
                .into_iter()
                .skip(self.index * self.size)
                .take(self.size)
                .collect()
        };

        Page {
            items,
            index: self.index,
            size: self.size,
            total_items,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub filters: FilterSet,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub page: PageRequest,
}

impl Query {
    pub fn new(filters: FilterSet) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn paged(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Filtered and sorted rows, without paging.
    pub fn select(&self, records: &[Record]) -> Vec<Record> {
        let mut selected = self.filters.filter(records);
        if let Some(sort) = &self.sort {
            sort.sort(&mut selected);
        }
        tracing::debug!(
            "Query kept {} of {} records (sort: {:?})",
            selected.len(),
            records.len(),
            self.sort.as_ref().map(ToString::to_string)
        );
        selected
    }

    pub fn run(&self, records: &[Record]) -> Page {
        self.page.slice(self.select(records))
    }
}

/// Number of records per distinct `field` value, in first-seen order.
/// Records without the field are left out.
pub fn count_by(records: &[Record], field: &str) -> Vec<ChartDatum> {
    aggregate(records, field, |_| Some(1.0))
}

/// Sum of numeric `value_field` per distinct `group_field`, in first-seen
/// order. Numeric strings such as `"2.5"` count; other values are skipped.
pub fn sum_by(records: &[Record], group_field: &str, value_field: &str) -> Vec<ChartDatum> {
    aggregate(records, group_field, |record| match record.field(value_field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn aggregate(
    records: &[Record],
    group_field: &str,
    value_of: impl Fn(&Record) -> Option<f64>,
) -> Vec<ChartDatum> {
    let mut order: Vec<ChartDatum> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in records {
        let (Some(label), Some(value)) = (record.field_text(group_field), value_of(record)) else {
            continue;
        };
        match slots.get(&label) {
            Some(&slot) => order[slot].value += value,
            None => {
                slots.insert(label.clone(), order.len());
                order.push(ChartDatum::new(label, value));
            }
        }
    }
    order
}

/// Distinct values of `field` in first-seen order, for populating selectors.
pub fn distinct_values(records: &[Record], field: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for value in records.iter().filter_map(|r| r.field_text(field)) {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Vec<Record> {
        vec![
            Record::new().with("id", 1).with("status", "approved").with("district", "Bastar"),
            Record::new().with("id", 2).with("status", "pending").with("district", "Bastar"),
            Record::new().with("id", 3).with("status", "approved").with("district", "Kanker"),
        ]
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records
            .iter()
            .map(|r| r.id().and_then(Value::as_i64).unwrap())
            .collect()
    }

    #[test]
    fn test_status_filter_keeps_input_order() {
        let filters = FilterSet::new().with_exact("status", "approved");
        assert_eq!(ids(&filters.filter(&claims())), vec![1, 3]);
    }

    #[test]
    fn test_empty_filters_return_everything() {
        let filters = FilterSet::new().with_exact("status", "").with_exact("district", "");
        assert!(!filters.is_active());
        assert_eq!(filters.filter(&claims()).len(), 3);
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let filters = FilterSet::new().with_exact("status", "Approved");
        assert!(filters.filter(&claims()).is_empty());
    }

    #[test]
    fn test_filter_soundness_and_completeness() {
        let records = claims();
        let filters = FilterSet::new()
            .with_exact("status", "approved")
            .with_exact("district", "Bastar");
        let kept = filters.filter(&records);

        for record in &records {
            let satisfies = record.field_text("status").as_deref() == Some("approved")
                && record.field_text("district").as_deref() == Some("Bastar");
            assert_eq!(kept.contains(record), satisfies);
        }
        assert_eq!(ids(&kept), vec![1]);
    }

    #[test]
    fn test_exact_match_on_numeric_field() {
        let filters = FilterSet::new().with_exact("id", "2");
        assert_eq!(ids(&filters.filter(&claims())), vec![2]);
    }

    #[test]
    fn test_search_spans_fields_case_insensitively() {
        let records = vec![
            Record::new().with("id", "FRA-2024-001").with("holder", "Ram Singh"),
            Record::new().with("id", "FRA-2024-045").with("holder", "Sita Devi"),
            Record::new().with("id", "FRA-2023-112").with("holder", "Maya Bai"),
        ];
        let filters =
            FilterSet::new().with_search(TextSearch::new("sita", &["id", "holder"]));
        assert_eq!(filters.filter(&records).len(), 1);

        let filters =
            FilterSet::new().with_search(TextSearch::new("fra-2024", &["id", "holder"]));
        assert_eq!(filters.filter(&records).len(), 2);

        let filters = FilterSet::new().with_search(TextSearch::new("", &["id"]));
        assert_eq!(filters.filter(&records).len(), 3);
    }

    #[test]
    fn test_date_window() {
        let records = vec![
            Record::new().with("id", 1).with("date", "2025-09-01"),
            Record::new().with("id", 2).with("date", "2025-08-20T10:00:00Z"),
            Record::new().with("id", 3).with("date", "2025-07-01"),
            Record::new().with("id", 4).with("date", "soon"),
            Record::new().with("id", 5),
        ];
        let window = DateWindow {
            field: "date".to_string(),
            days: 30,
            reference: NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(),
        };
        let filters = FilterSet::new().with_date_window(window);
        assert!(filters.is_active());
        assert_eq!(ids(&filters.filter(&records)), vec![1, 2]);
    }

    #[test]
    fn test_clear_resets_constraints() {
        let mut filters = FilterSet::new()
            .with_exact("state", "Odisha")
            .with_search(TextSearch::new("balaghat", &["village"]));
        assert!(filters.is_active());
        filters.clear();
        assert!(!filters.is_active());
        assert!(filters.exact.contains_key("state"));
    }

    #[test]
    fn test_sort_is_stable_both_directions() {
        let records = vec![
            Record::new().with("id", 1).with("district", "Kanker"),
            Record::new().with("id", 2).with("district", "Bastar"),
            Record::new().with("id", 3).with("district", "Kanker"),
            Record::new().with("id", 4).with("district", "Bastar"),
        ];

        let mut asc = records.clone();
        SortSpec::ascending("district").sort(&mut asc);
        assert_eq!(ids(&asc), vec![2, 4, 1, 3]);

        let mut desc = records;
        SortSpec::descending("district").sort(&mut desc);
        assert_eq!(ids(&desc), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_numbers_sort_numerically_and_missing_sorts_first() {
        let mut records = vec![
            Record::new().with("id", 10).with("area", 12.5),
            Record::new().with("id", 11).with("area", 2.5),
            Record::new().with("id", 12),
            Record::new().with("id", 13).with("area", 100),
        ];
        SortSpec::ascending("area").sort(&mut records);
        assert_eq!(ids(&records), vec![12, 11, 10, 13]);

        SortSpec::descending("area").sort(&mut records);
        assert_eq!(ids(&records), vec![13, 10, 11, 12]);
    }

    #[test]
    fn test_mixed_types_fall_back_to_text_order() {
        assert_eq!(
            compare_values(Some(&Value::from(9)), Some(&Value::from("10"))),
            Ordering::Greater
        );
    }

    #[test]
    fn test_sort_spec_parsing() {
        let spec: SortSpec = "date,descending".parse().unwrap();
        assert_eq!(spec, SortSpec::descending("date"));
        assert_eq!(spec.to_string(), "date,descending");

        let spec: SortSpec = "title".parse().unwrap();
        assert_eq!(spec.direction, SortDirection::Ascending);

        assert!("date,sideways".parse::<SortSpec>().is_err());
        assert!(",asc".parse::<SortSpec>().is_err());
    }

    #[test]
    fn test_pages_reconstruct_the_selection() {
        let records: Vec<Record> = (1..=7).map(|i| Record::new().with("id", i)).collect();
        let query = Query::default().sorted_by(SortSpec::descending("id"));
        let selected = query.select(&records);

        let mut rebuilt = Vec::new();
        let first = PageRequest::new(0, 3).slice(selected.clone());
        assert_eq!(first.total_pages, 3);
        for index in 0..first.total_pages {
            rebuilt.extend(PageRequest::new(index, 3).slice(selected.clone()).items);
        }
        assert_eq!(rebuilt, selected);
        assert_eq!(ids(&rebuilt), vec![7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_page_edges() {
        let records: Vec<Record> = (1..=4).map(|i| Record::new().with("id", i)).collect();

        let past_end = PageRequest::new(5, 2).slice(records.clone());
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_items, 4);

        let unbounded = PageRequest::new(0, 0).slice(records.clone());
        assert_eq!(unbounded.items.len(), 4);
        assert_eq!(unbounded.total_pages, 1);

        let empty = PageRequest::new(0, 10).slice(Vec::new());
        assert!(empty.items.is_empty());
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_run_filters_sorts_then_pages() {
        let query = Query::new(FilterSet::new().with_exact("status", "approved"))
            .sorted_by(SortSpec::descending("id"))
            .paged(PageRequest::new(0, 1));
        let page = query.run(&claims());
        assert_eq!(ids(&page.items), vec![3]);
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_aggregations_keep_first_seen_order() {
        let records = vec![
            Record::new().with("status", "Approved").with("area", 2.5),
            Record::new().with("status", "Pending").with("area", "1.8"),
            Record::new().with("status", "Approved").with("area", 3.2),
            Record::new().with("area", 9.0),
            Record::new().with("status", "Rejected").with("area", "n/a"),
        ];

        let counts = count_by(&records, "status");
        let labels: Vec<&str> = counts.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Approved", "Pending", "Rejected"]);
        assert_eq!(counts[0].value, 2.0);

        let areas = sum_by(&records, "status", "area");
        assert_eq!(areas.len(), 2);
        assert!((areas[0].value - 5.7).abs() < 1e-9);
        assert!((areas[1].value - 1.8).abs() < 1e-9);

        assert_eq!(
            distinct_values(&records, "status"),
            vec!["Approved", "Pending", "Rejected"]
        );
    }
}
