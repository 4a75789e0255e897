use crate::app::AppState;
use crate::model::DivisionRow;
use crate::query;

/// Free-text search term shared between the header search box and the table.
///
/// The box writes through [`GlobalSearch::update_search_term`]; the table reads
/// [`GlobalSearch::term`] and can compare [`GlobalSearch::revision`] to notice changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalSearch {
    term: String,
    revision: u64,
}

impl GlobalSearch {
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_active(&self) -> bool {
        !self.term.is_empty()
    }

    /// Store the trimmed term. Returns `true` if it changed.
    pub fn update_search_term(&mut self, term: &str) -> bool {
        let trimmed = term.trim();
        if trimmed == self.term {
            return false;
        }
        self.term = trimmed.to_string();
        self.revision += 1;
        true
    }

    pub fn clear_search(&mut self) -> bool {
        self.update_search_term("")
    }
}

/// Case-insensitive match of an already lowercased term against the searchable fields.
pub fn row_matches(row: &DivisionRow, term_lower: &str) -> bool {
    if term_lower.is_empty() {
        return true;
    }
    let d = &row.division;
    d.name.to_lowercase().contains(term_lower)
        || row
            .parent_name
            .as_deref()
            .is_some_and(|p| p.to_lowercase().contains(term_lower))
        || d.collaborators_count.to_string().contains(term_lower)
        || d.level.to_string().contains(term_lower)
        || row.subdivision_count.to_string().contains(term_lower)
        || d
            .ambassador_full_name
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(term_lower))
}

/// Recompute the visible rows from everything loaded and keep the cursor in range.
pub fn apply_filters_and_search(app: &mut AppState) {
    let focused = app.rows.get(app.selected_index).map(DivisionRow::id);
    app.rows = query::apply(&app.rows_all, app.search.term(), &app.filters, app.sort);
    app.selected_index = focused
        .and_then(|id| app.rows.iter().position(|r| r.id() == id))
        .unwrap_or(0)
        .min(app.rows.len().saturating_sub(1));
    app.seen_search_revision = app.search.revision();
}
