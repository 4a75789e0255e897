//! Checkbox selection over the loaded divisions.

use std::collections::BTreeSet;

use crate::model::{DivisionId, DivisionRow};

/// Aggregate state for the header checkbox.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CheckState {
    None,
    Partial,
    All,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    checked: BTreeSet<DivisionId>,
}

impl Selection {
    pub fn set_checked(&mut self, id: DivisionId, checked: bool) {
        if checked {
            self.checked.insert(id);
        } else {
            self.checked.remove(&id);
        }
    }

    pub fn toggle(&mut self, id: DivisionId) {
        let now = !self.is_checked(id);
        self.set_checked(id, now);
    }

    pub fn check_all(&mut self, rows: &[DivisionRow], checked: bool) {
        if checked {
            self.checked.extend(rows.iter().map(DivisionRow::id));
        } else {
            self.checked.clear();
        }
    }

    pub fn is_checked(&self, id: DivisionId) -> bool {
        self.checked.contains(&id)
    }

    /// `All` needs at least one row and every row checked.
    pub fn check_state(&self, rows: &[DivisionRow]) -> CheckState {
        let count = rows.iter().filter(|r| self.is_checked(r.id())).count();
        if count > 0 && count == rows.len() {
            CheckState::All
        } else if count > 0 {
            CheckState::Partial
        } else {
            CheckState::None
        }
    }

    /// Forget ids that are not among `rows`.
    pub fn retain_existing(&mut self, rows: &[DivisionRow]) {
        self.checked
            .retain(|id| rows.iter().any(|r| r.id() == *id));
    }

    pub fn ids(&self) -> Vec<DivisionId> {
        self.checked.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.checked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }
}
