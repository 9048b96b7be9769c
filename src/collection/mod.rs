//! The list-view query pipeline shared by every collection screen
//! (jobs, resumes, team): filter -> sort -> paginate, in that order.
//!
//! Records flow one way through the stages. Filtering is predicate
//! conjunction (every active predicate must match), sorting is stable so
//! records with equal keys keep their previous relative order, and
//! pagination clamps the requested page against the collection so a
//! page-size change can never strand a caller on an empty slice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const PER_PAGE_OPTIONS: [usize; 4] = [5, 10, 20, 50];
pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

/// A sort key projected out of a record. String keys compare
/// case-insensitively; dates compare as epoch milliseconds.
#[derive(Debug, Clone)]
pub enum SortValue {
    Text(String),
    Number(f64),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => {
                a.to_lowercase().cmp(&b.to_lowercase())
            }
            (SortValue::Number(a), SortValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortValue::Time(a), SortValue::Time(b)) => {
                a.timestamp_millis().cmp(&b.timestamp_millis())
            }
            // A single sort key always projects one variant; mixed
            // comparisons only arise from a buggy key fn. Order them
            // arbitrarily but consistently.
            (SortValue::Text(_), _) => Ordering::Less,
            (_, SortValue::Text(_)) => Ordering::Greater,
            (SortValue::Number(_), _) => Ordering::Less,
            (_, SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Case-insensitive substring search across a record's named fields.
/// An empty query matches everything.
pub fn text_match(haystack: &[&str], query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    haystack
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

/// Categorical equality filter. `None` is the "all" sentinel: no constraint.
pub fn category_match<T: PartialEq>(value: &T, wanted: Option<&T>) -> bool {
    match wanted {
        Some(wanted) => value == wanted,
        None => true,
    }
}

/// Stable sort by a projected key. `slice::sort_by` is stable, so equal
/// keys keep their prior relative order; that is the documented tie-break.
pub fn sort_records<T, F>(records: &mut [T], direction: SortDirection, key_fn: F)
where
    F: Fn(&T) -> SortValue,
{
    records.sort_by(|a, b| {
        let ordering = key_fn(a).compare(&key_fn(b));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(PER_PAGE_OPTIONS[0], PER_PAGE_OPTIONS[3]),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub view: ViewMode,
}

/// Slice out the visible page. The requested page index is clamped to the
/// last non-empty page (page 1 for an empty collection), so switching to a
/// larger page size while deep in the list lands on real records instead
/// of an out-of-range empty slice.
pub fn paginate<T>(records: Vec<T>, request: PageRequest, view: ViewMode) -> Paged<T> {
    let total_items = records.len();
    let total_pages = if total_items == 0 {
        1
    } else {
        (total_items + request.per_page - 1) / request.per_page
    };
    let page = request.page.clamp(1, total_pages);

    let items: Vec<T> = records
        .into_iter()
        .skip((page - 1) * request.per_page)
        .take(request.per_page)
        .collect();

    Paged {
        items,
        page,
        per_page: request.per_page,
        total_items,
        total_pages,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        title: String,
        department: String,
        posted: DateTime<Utc>,
        applicants: u32,
    }

    fn row(title: &str, department: &str, day: u32, applicants: u32) -> Row {
        Row {
            title: title.to_string(),
            department: department.to_string(),
            posted: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            applicants,
        }
    }

    fn sample() -> Vec<Row> {
        vec![
            row("Backend Engineer", "Engineering", 5, 12),
            row("Product Designer", "Design", 2, 30),
            row("Data Analyst", "Analytics", 9, 7),
            row("Frontend Engineer", "Engineering", 1, 25),
            row("Recruiter", "People", 7, 3),
        ]
    }

    #[test]
    fn filter_output_is_subset_of_input() {
        let rows = sample();
        let filtered: Vec<&Row> = rows
            .iter()
            .filter(|r| text_match(&[&r.title, &r.department], "engineer"))
            .collect();
        assert!(filtered.iter().all(|f| rows.contains(*f)));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn empty_query_matches_everything() {
        let rows = sample();
        let kept = rows
            .iter()
            .filter(|r| text_match(&[&r.title], "   "))
            .count();
        assert_eq!(kept, rows.len());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        assert!(text_match(&["Product Designer"], "DESIGN"));
        assert!(text_match(&["Product Designer"], "duct des"));
        assert!(!text_match(&["Product Designer"], "engineer"));
    }

    #[test]
    fn category_none_means_no_constraint() {
        assert!(category_match(&"Engineering", None));
        assert!(category_match(&"Engineering", Some(&"Engineering")));
        assert!(!category_match(&"Engineering", Some(&"Design")));
    }

    #[test]
    fn filter_by_absent_category_yields_empty_not_error() {
        let rows = sample();
        let filtered: Vec<&Row> = rows
            .iter()
            .filter(|r| category_match(&r.department.as_str(), Some(&"Legal")))
            .collect();
        assert!(filtered.is_empty());
    }

    #[test]
    fn sort_is_a_permutation() {
        let rows = sample();
        let mut sorted = rows.clone();
        sort_records(&mut sorted, SortDirection::Desc, |r| {
            SortValue::Number(r.applicants as f64)
        });
        assert_eq!(sorted.len(), rows.len());
        for r in &rows {
            assert!(sorted.contains(r));
        }
    }

    #[test]
    fn sort_is_idempotent() {
        let mut once = sample();
        sort_records(&mut once, SortDirection::Asc, |r| {
            SortValue::Text(r.title.clone())
        });
        let mut twice = once.clone();
        sort_records(&mut twice, SortDirection::Asc, |r| {
            SortValue::Text(r.title.clone())
        });
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_by_date_asc_and_title_desc() {
        // The two worked examples: [{B, 2024-01-02}, {A, 2024-01-01}].
        let mut rows = vec![row("B", "x", 2, 0), row("A", "x", 1, 0)];
        sort_records(&mut rows, SortDirection::Asc, |r| SortValue::Time(r.posted));
        assert_eq!(rows[0].title, "A");
        assert_eq!(rows[1].title, "B");

        sort_records(&mut rows, SortDirection::Desc, |r| {
            SortValue::Text(r.title.clone())
        });
        assert_eq!(rows[0].title, "B");
        assert_eq!(rows[1].title, "A");
    }

    #[test]
    fn equal_keys_keep_prior_order() {
        let mut rows = vec![
            row("Backend Engineer", "Engineering", 1, 5),
            row("Frontend Engineer", "Engineering", 2, 5),
            row("Data Analyst", "Analytics", 3, 5),
        ];
        sort_records(&mut rows, SortDirection::Asc, |r| {
            SortValue::Number(r.applicants as f64)
        });
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Backend Engineer", "Frontend Engineer", "Data Analyst"]
        );
    }

    #[test]
    fn text_sort_ignores_case() {
        let mut rows = vec![row("beta", "x", 1, 0), row("Alpha", "x", 2, 0)];
        sort_records(&mut rows, SortDirection::Asc, |r| {
            SortValue::Text(r.title.clone())
        });
        assert_eq!(rows[0].title, "Alpha");
    }

    #[test]
    fn page_slices_never_exceed_per_page() {
        let rows: Vec<u32> = (0..23).collect();
        for page in 1..=10 {
            let request = PageRequest { page, per_page: 5 };
            let paged = paginate(rows.clone(), request, ViewMode::Grid);
            assert!(paged.items.len() <= 5);
        }
    }

    #[test]
    fn concatenated_pages_reconstruct_the_collection() {
        let rows: Vec<u32> = (0..23).collect();
        let per_page = 5;
        let mut rebuilt = Vec::new();
        let total_pages = paginate(rows.clone(), PageRequest { page: 1, per_page }, ViewMode::Grid)
            .total_pages;
        for page in 1..=total_pages {
            let paged = paginate(rows.clone(), PageRequest { page, per_page }, ViewMode::Grid);
            rebuilt.extend(paged.items);
        }
        assert_eq!(rebuilt, rows);
    }

    #[test]
    fn growing_page_size_clamps_back_into_range() {
        // 12 items viewed at page 3 of per_page 10; switching to 50 must
        // clamp to page 1 rather than produce an empty slice.
        let rows: Vec<u32> = (0..12).collect();
        let paged = paginate(
            rows,
            PageRequest {
                page: 3,
                per_page: 50,
            },
            ViewMode::List,
        );
        assert_eq!(paged.page, 1);
        assert_eq!(paged.items.len(), 12);
    }

    #[test]
    fn empty_collection_clamps_to_page_one() {
        let paged = paginate(
            Vec::<u32>::new(),
            PageRequest {
                page: 7,
                per_page: 20,
            },
            ViewMode::Grid,
        );
        assert_eq!(paged.page, 1);
        assert_eq!(paged.total_pages, 1);
        assert!(paged.items.is_empty());
    }

    #[test]
    fn page_request_clamps_per_page_into_menu_range() {
        let request = PageRequest::new(Some(0), Some(500));
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, 50);

        let request = PageRequest::new(None, Some(1));
        assert_eq!(request.per_page, 5);
    }
}
