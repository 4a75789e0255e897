//! Column filters and sorting over enriched division rows.
//!
//! The whole view is recomputed from the loaded rows on every change:
//! global search first, then column filters, then the single active sort.
//!
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::DivisionRow;
use crate::search::row_matches;

/// Sortable table columns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    ParentName,
    Level,
    Collaborators,
    Subdivisions,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Name,
        SortKey::ParentName,
        SortKey::Level,
        SortKey::Collaborators,
        SortKey::Subdivisions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::ParentName => "parent",
            SortKey::Level => "level",
            SortKey::Collaborators => "collaborators",
            SortKey::Subdivisions => "subdivisions",
        }
    }

    /// Ascending comparison for this column.
    pub fn compare(self, a: &DivisionRow, b: &DivisionRow) -> Ordering {
        match self {
            SortKey::Name => compare_text(a.name(), b.name()),
            SortKey::ParentName => compare_text(a.parent_name_or_empty(), b.parent_name_or_empty()),
            SortKey::Level => a.division.level.cmp(&b.division.level),
            SortKey::Collaborators => a
                .division
                .collaborators_count
                .cmp(&b.division.collaborators_count),
            SortKey::Subdivisions => a.subdivision_count.cmp(&b.subdivision_count),
        }
    }
}

/// Accent- and case-insensitive first, so "Área" sorts with "a"; ties broken bytewise.
fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// NFD decomposition with combining marks dropped, then lowercased.
fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascend,
    Descend,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Sort {
    pub fn ascend(key: SortKey) -> Self {
        Self {
            key,
            order: SortOrder::Ascend,
        }
    }

    pub fn compare(&self, a: &DivisionRow, b: &DivisionRow) -> Ordering {
        let ord = self.key.compare(a, b);
        match self.order {
            SortOrder::Ascend => ord,
            SortOrder::Descend => ord.reverse(),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.order {
            SortOrder::Ascend => "asc",
            SortOrder::Descend => "desc",
        };
        write!(f, "{}:{}", self.key.label(), dir)
    }
}

impl FromStr for Sort {
    type Err = String;

    /// Parse `key[:asc|:desc]`, e.g. `collaborators:desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, ':');
        let key_raw = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let key = SortKey::ALL
            .into_iter()
            .find(|k| k.label() == key_raw)
            .ok_or_else(|| {
                format!(
                    "unknown sort column {key_raw:?} (expected one of: name, parent, level, collaborators, subdivisions)"
                )
            })?;
        let order = match parts.next().map(|d| d.trim().to_ascii_lowercase()).as_deref() {
            None | Some("asc") | Some("ascend") => SortOrder::Ascend,
            Some("desc") | Some("descend") => SortOrder::Descend,
            Some(other) => return Err(format!("unknown sort direction {other:?}")),
        };
        Ok(Self { key, order })
    }
}

/// Next sort state after activating `key`: Ascend, then Descend, then off.
/// Activating a different column resets to Ascend on that column.
pub fn toggle_sort(current: Option<Sort>, key: SortKey) -> Option<Sort> {
    match current {
        Some(Sort {
            key: k,
            order: SortOrder::Ascend,
        }) if k == key => Some(Sort {
            key,
            order: SortOrder::Descend,
        }),
        Some(Sort {
            key: k,
            order: SortOrder::Descend,
        }) if k == key => None,
        _ => Some(Sort::ascend(key)),
    }
}

/// Columns offering a value filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterColumn {
    Name,
    ParentName,
    Level,
}

impl FilterColumn {
    pub fn title(self) -> &'static str {
        match self {
            FilterColumn::Name => "Division",
            FilterColumn::ParentName => "Parent division",
            FilterColumn::Level => "Level",
        }
    }

    pub fn next(self) -> Self {
        match self {
            FilterColumn::Name => FilterColumn::ParentName,
            FilterColumn::ParentName => FilterColumn::Level,
            FilterColumn::Level => FilterColumn::Name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Name(String),
    ParentName(String),
    Level(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOption {
    pub text: String,
    pub value: FilterValue,
}

/// Selectable values per filterable column, derived from the loaded rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub names: Vec<FilterOption>,
    pub parent_names: Vec<FilterOption>,
    pub levels: Vec<FilterOption>,
}

impl FilterOptions {
    pub fn from_rows(rows: &[DivisionRow]) -> Self {
        let mut seen = HashSet::new();
        let names = rows
            .iter()
            .filter(|r| seen.insert(r.name()))
            .map(|r| FilterOption {
                text: r.name().to_string(),
                value: FilterValue::Name(r.name().to_string()),
            })
            .collect();

        let mut seen = HashSet::new();
        let parent_names = rows
            .iter()
            .filter_map(|r| r.parent_name.as_deref())
            .filter(|p| !p.is_empty() && seen.insert(*p))
            .map(|p| FilterOption {
                text: p.to_string(),
                value: FilterValue::ParentName(p.to_string()),
            })
            .collect();

        let levels: BTreeSet<u32> = rows.iter().map(|r| r.division.level).collect();
        let levels = levels
            .into_iter()
            .map(|level| FilterOption {
                text: format!("Level {level}"),
                value: FilterValue::Level(level),
            })
            .collect();

        Self {
            names,
            parent_names,
            levels,
        }
    }

    pub fn for_column(&self, column: FilterColumn) -> &[FilterOption] {
        match column {
            FilterColumn::Name => &self.names,
            FilterColumn::ParentName => &self.parent_names,
            FilterColumn::Level => &self.levels,
        }
    }
}

/// Values selected per column. An empty column does not filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnFilters {
    pub names: BTreeSet<String>,
    pub parent_names: BTreeSet<String>,
    pub levels: BTreeSet<u32>,
}

impl ColumnFilters {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.parent_names.is_empty() && self.levels.is_empty()
    }

    pub fn contains(&self, value: &FilterValue) -> bool {
        match value {
            FilterValue::Name(n) => self.names.contains(n),
            FilterValue::ParentName(p) => self.parent_names.contains(p),
            FilterValue::Level(l) => self.levels.contains(l),
        }
    }

    pub fn toggle(&mut self, value: &FilterValue) {
        fn flip<T: Ord + Clone>(set: &mut BTreeSet<T>, v: &T) {
            if !set.remove(v) {
                set.insert(v.clone());
            }
        }
        match value {
            FilterValue::Name(n) => flip(&mut self.names, n),
            FilterValue::ParentName(p) => flip(&mut self.parent_names, p),
            FilterValue::Level(l) => flip(&mut self.levels, l),
        }
    }

    pub fn clear_column(&mut self, column: FilterColumn) {
        match column {
            FilterColumn::Name => self.names.clear(),
            FilterColumn::ParentName => self.parent_names.clear(),
            FilterColumn::Level => self.levels.clear(),
        }
    }

    pub fn is_active(&self, column: FilterColumn) -> bool {
        match column {
            FilterColumn::Name => !self.names.is_empty(),
            FilterColumn::ParentName => !self.parent_names.is_empty(),
            FilterColumn::Level => !self.levels.is_empty(),
        }
    }

    /// Exact-match test; a row without parent only matches the empty parent name.
    pub fn matches(&self, row: &DivisionRow) -> bool {
        (self.names.is_empty() || self.names.contains(row.name()))
            && (self.parent_names.is_empty()
                || self.parent_names.contains(row.parent_name_or_empty()))
            && (self.levels.is_empty() || self.levels.contains(&row.division.level))
    }

    /// Drop selected values that no longer exist among `options`.
    pub fn retain_known(&mut self, options: &FilterOptions) {
        let known = |col: FilterColumn| -> Vec<FilterValue> {
            options
                .for_column(col)
                .iter()
                .map(|o| o.value.clone())
                .collect()
        };
        let names = known(FilterColumn::Name);
        self.names
            .retain(|n| names.contains(&FilterValue::Name(n.clone())));
        let parents = known(FilterColumn::ParentName);
        self.parent_names
            .retain(|p| p.is_empty() || parents.contains(&FilterValue::ParentName(p.clone())));
        let levels = known(FilterColumn::Level);
        self.levels
            .retain(|l| levels.contains(&FilterValue::Level(*l)));
    }
}

/// Derive the visible rows: global search, then column filters, then a stable sort.
pub fn apply(
    rows: &[DivisionRow],
    search_term: &str,
    filters: &ColumnFilters,
    sort: Option<Sort>,
) -> Vec<DivisionRow> {
    let term = search_term.trim().to_lowercase();
    let mut out: Vec<DivisionRow> = rows
        .iter()
        .filter(|r| row_matches(r, &term))
        .filter(|r| filters.matches(r))
        .cloned()
        .collect();
    if let Some(sort) = sort {
        out.sort_by(|a, b| sort.compare(a, b));
    }
    out
}
