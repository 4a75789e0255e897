//! Event loop and key handling for the divisions screen.
//!
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::Backend;
use std::time::Duration;

use crate::app::keymap::KeyAction;
use crate::app::selection::CheckState;
use crate::app::{AppState, InputMode, ModalState, NameTarget, Subdivisions};
use crate::model::{self, DivisionPayload};
use crate::query::{self, SortKey};
use crate::search::apply_filters_and_search;
use crate::ui;

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        // draw the loading state first, then fetch
        if app.reload_requested {
            reload(app);
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_key(app, key) {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Fetch all divisions and rebuild everything derived from them.
///
/// On failure the previously loaded rows stay and an error modal opens.
pub fn reload(app: &mut AppState) {
    app.loading = true;
    app.reload_requested = false;
    match app.api.list_all_enriched() {
        Ok(rows) => {
            tracing::info!(count = rows.len(), "divisions loaded");
            let dangling = model::dangling_parents(&rows);
            if !dangling.is_empty() {
                tracing::warn!(?dangling, "divisions reference unknown parents");
            }
            app.filter_options = query::FilterOptions::from_rows(&rows);
            app.filters.retain_known(&app.filter_options);
            app.selection.retain_existing(&rows);
            app.rows_all = rows;
            app.subdivisions = None;
            apply_filters_and_search(app);
        }
        Err(e) => {
            tracing::error!(error = %e, "could not load divisions");
            app.show_error(format!("Could not load divisions: {e}"));
        }
    }
    app.loading = false;
}

/// Handle one key press. Returns `false` when the application should quit.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal => {
            let Some(action) = app.keymap.resolve(&key) else {
                return true;
            };
            return handle_action(app, action);
        }
        InputMode::Search => handle_search_key(app, key.code),
        InputMode::Modal => handle_modal_key(app, key.code),
    }
    true
}

fn handle_action(app: &mut AppState, action: KeyAction) -> bool {
    match action {
        KeyAction::Quit => return false,
        KeyAction::Ignore => {}
        KeyAction::StartSearch => {
            app.search_input = app.search.term().to_string();
            app.input_mode = InputMode::Search;
        }
        KeyAction::ClearSearch => {
            app.search_input.clear();
            if app.search.clear_search() {
                apply_filters_and_search(app);
            }
        }
        KeyAction::OpenFilterMenu => {
            app.modal = Some(ModalState::FilterMenu {
                column: query::FilterColumn::Name,
                selected: 0,
            });
            app.input_mode = InputMode::Modal;
        }
        KeyAction::ClearFilters => {
            app.filters = query::ColumnFilters::default();
            apply_filters_and_search(app);
        }
        KeyAction::SortByName => sort_by(app, SortKey::Name),
        KeyAction::SortByParent => sort_by(app, SortKey::ParentName),
        KeyAction::SortByLevel => sort_by(app, SortKey::Level),
        KeyAction::SortByCollaborators => sort_by(app, SortKey::Collaborators),
        KeyAction::SortBySubdivisions => sort_by(app, SortKey::Subdivisions),
        KeyAction::ToggleCheck => {
            if let Some(id) = app.selected_row().map(|r| r.id()) {
                app.selection.toggle(id);
            }
        }
        KeyAction::ToggleCheckAll => {
            let all = app.selection.check_state(&app.rows_all) == CheckState::All;
            app.selection.check_all(&app.rows_all, !all);
        }
        KeyAction::Reload => {
            app.loading = true;
            app.reload_requested = true;
        }
        KeyAction::NewDivision => {
            let parent_id = app.selected_row().map(|r| r.id());
            app.modal = Some(ModalState::NameInput {
                target: NameTarget::Create { parent_id },
                value: String::new(),
            });
            app.input_mode = InputMode::Modal;
        }
        KeyAction::RenameDivision => {
            if let Some(row) = app.selected_row() {
                app.modal = Some(ModalState::NameInput {
                    target: NameTarget::Rename { id: row.id() },
                    value: row.name().to_string(),
                });
                app.input_mode = InputMode::Modal;
            }
        }
        KeyAction::DeleteSelection => {
            let ids = if app.selection.is_empty() {
                app.selected_row().map(|r| vec![r.id()]).unwrap_or_default()
            } else {
                app.selection.ids()
            };
            if !ids.is_empty() {
                app.modal = Some(ModalState::DeleteConfirm { selected: 1, ids });
                app.input_mode = InputMode::Modal;
            }
        }
        KeyAction::ShowSubdivisions => load_subdivisions(app),
        KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
        KeyAction::MoveUp => {
            app.selected_index = app.selected_index.saturating_sub(1);
        }
        KeyAction::MoveDown => {
            if app.selected_index + 1 < app.rows.len() {
                app.selected_index += 1;
            }
        }
        KeyAction::MoveLeftPage => {
            let rpp = app.rows_per_page.max(1);
            app.selected_index = app.selected_index.saturating_sub(rpp);
        }
        KeyAction::MoveRightPage => {
            let rpp = app.rows_per_page.max(1);
            let new_idx = app.selected_index.saturating_add(rpp);
            app.selected_index = new_idx.min(app.rows.len().saturating_sub(1));
        }
    }
    true
}

fn sort_by(app: &mut AppState, key: SortKey) {
    app.sort = query::toggle_sort(app.sort, key);
    apply_filters_and_search(app);
}

/// Every edit of the search box updates the shared term and the table at once.
fn handle_search_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.search_input.clear();
            app.search.clear_search();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.search.update_search_term(&app.search_input);
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            app.search.update_search_term(&app.search_input);
        }
        _ => {}
    }
    if app.search.revision() != app.seen_search_revision {
        apply_filters_and_search(app);
    }
}

fn load_subdivisions(app: &mut AppState) {
    let Some(id) = app.selected_row().map(|r| r.id()) else {
        return;
    };
    match app.api.list_subdivisions(id) {
        Ok(items) => {
            tracing::debug!(id, count = items.len(), "subdivisions loaded");
            app.subdivisions = Some(Subdivisions { parent_id: id, items });
        }
        Err(e) => {
            tracing::error!(id, error = %e, "could not load subdivisions");
            app.show_error(format!("Could not load subdivisions: {e}"));
        }
    }
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    let Some(modal) = app.modal.as_mut() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    match modal {
        ModalState::Info { .. } => {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.close_modal();
            }
        }
        ModalState::FilterMenu { column, selected } => {
            let options = app.filter_options.for_column(*column);
            match code {
                KeyCode::Esc | KeyCode::Char('q') => app.close_modal(),
                KeyCode::Tab => {
                    *column = column.next();
                    *selected = 0;
                }
                KeyCode::Up | KeyCode::Char('k') => *selected = selected.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    if *selected + 1 < options.len() {
                        *selected += 1;
                    }
                }
                KeyCode::Char(' ') | KeyCode::Enter => {
                    if let Some(opt) = options.get(*selected) {
                        app.filters.toggle(&opt.value);
                        apply_filters_and_search(app);
                    }
                }
                KeyCode::Char('c') => {
                    app.filters.clear_column(*column);
                    apply_filters_and_search(app);
                }
                _ => {}
            }
        }
        ModalState::DeleteConfirm { selected, ids } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => *selected = 0,
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                *selected = 1
            }
            KeyCode::Enter => {
                if *selected == 0 {
                    let ids = std::mem::take(ids);
                    app.close_modal();
                    delete_divisions(app, &ids);
                } else {
                    app.close_modal();
                }
            }
            _ => {}
        },
        ModalState::NameInput { target, value } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Char(c) => value.push(c),
            KeyCode::Enter => {
                let name = value.trim().to_string();
                if name.is_empty() {
                    return;
                }
                let target = target.clone();
                app.close_modal();
                submit_name(app, target, name);
            }
            _ => {}
        },
    }
}

fn submit_name(app: &mut AppState, target: NameTarget, name: String) {
    let result = match target {
        NameTarget::Create { parent_id } => {
            let parent = parent_id.and_then(|id| app.rows_all.iter().find(|r| r.id() == id));
            let payload = DivisionPayload::child_of(name, parent);
            app.api.create(&payload).map(|d| {
                tracing::info!(id = d.id, name = %d.name, "division created");
            })
        }
        NameTarget::Rename { id } => app
            .api
            .update(id, &DivisionPayload::rename(name))
            .map(|d| {
                tracing::info!(id, name = %d.name, "division renamed");
            }),
    };
    match result {
        Ok(()) => reload(app),
        Err(e) => {
            tracing::error!(error = %e, "could not save division");
            app.show_error(format!("Could not save division: {e}"));
        }
    }
}

fn delete_divisions(app: &mut AppState, ids: &[model::DivisionId]) {
    let mut failures = Vec::new();
    for &id in ids {
        match app.api.delete(id) {
            Ok(()) => {
                tracing::info!(id, "division deleted");
                app.selection.set_checked(id, false);
            }
            Err(e) => {
                tracing::error!(id, error = %e, "could not delete division");
                failures.push(format!("#{id}: {e}"));
            }
        }
    }
    reload(app);
    if !failures.is_empty() {
        let mut message = format!("Could not delete:\n{}", failures.join("\n"));
        // keep a reload error visible next to the delete failures
        if let Some(ModalState::Info { message: reload_error }) = &app.modal {
            message = format!("{reload_error}\n\n{message}");
        }
        app.show_error(message);
    }
}
