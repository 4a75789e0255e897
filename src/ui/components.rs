//! Shared UI components (status bar, keybindings pane, modals).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::collections::{BTreeMap, BTreeSet};

use crate::app::keymap::{KeyAction, Keymap};
use crate::app::{AppState, InputMode, ModalState, NameTarget};

/// Render the bottom status bar with mode, counts, sort and filters.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let chips_str = if app.filters.is_empty() {
        String::new()
    } else {
        let mut chips = Vec::new();
        if !app.filters.names.is_empty() {
            chips.push(format!("division={}", app.filters.names.len()));
        }
        if !app.filters.parent_names.is_empty() {
            chips.push(format!("parent={}", app.filters.parent_names.len()));
        }
        if !app.filters.levels.is_empty() {
            let levels: Vec<String> = app.filters.levels.iter().map(|l| l.to_string()).collect();
            chips.push(format!("level={}", levels.join("|")));
        }
        format!("  filters:[{}]", chips.join(","))
    };
    let sort_str = app
        .sort
        .map(|s| format!("  sort:{s}"))
        .unwrap_or_default();
    let msg = format!(
        "mode: {mode}  rows:{}/{}  checked:{}  rows/page:{}{}{}  ?: keys",
        app.rows.len(),
        app.rows_all.len(),
        app.selection.len(),
        app.rows_per_page,
        sort_str,
        chips_str
    );
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

fn action_label(action: KeyAction) -> Option<(&'static str, &'static str)> {
    let entry = match action {
        KeyAction::Quit => ("General", "Quit"),
        KeyAction::StartSearch => ("General", "Search"),
        KeyAction::ClearSearch => ("General", "Clear search"),
        KeyAction::Reload => ("General", "Reload"),
        KeyAction::ToggleKeybindsPane => ("General", "Toggle this pane"),
        KeyAction::OpenFilterMenu => ("Table", "Filter columns"),
        KeyAction::ClearFilters => ("Table", "Clear filters"),
        KeyAction::SortByName => ("Table", "Sort by division"),
        KeyAction::SortByParent => ("Table", "Sort by parent"),
        KeyAction::SortByLevel => ("Table", "Sort by level"),
        KeyAction::SortByCollaborators => ("Table", "Sort by collaborators"),
        KeyAction::SortBySubdivisions => ("Table", "Sort by subdivisions"),
        KeyAction::ToggleCheck => ("Table", "Check row"),
        KeyAction::ToggleCheckAll => ("Table", "Check all"),
        KeyAction::ShowSubdivisions => ("Table", "Load subdivisions"),
        KeyAction::NewDivision => ("Edit", "New subdivision"),
        KeyAction::RenameDivision => ("Edit", "Rename"),
        KeyAction::DeleteSelection => ("Edit", "Delete checked"),
        KeyAction::MoveUp => ("Navigation", "Move up"),
        KeyAction::MoveDown => ("Navigation", "Move down"),
        KeyAction::MoveLeftPage => ("Navigation", "Previous page"),
        KeyAction::MoveRightPage => ("Navigation", "Next page"),
        KeyAction::Ignore => return None,
    };
    Some(entry)
}

/// Render the right-side keybindings viewer grouped by section.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let mut sections: BTreeMap<&'static str, BTreeMap<&'static str, BTreeSet<String>>> =
        BTreeMap::new();
    for ((mods, code), action) in app.keymap.all_bindings() {
        if let Some((section, label)) = action_label(action) {
            sections
                .entry(section)
                .or_default()
                .entry(label)
                .or_default()
                .insert(Keymap::format_key(mods, code));
        }
    }

    let max_label = sections
        .values()
        .flat_map(|s| s.keys())
        .map(|k| k.len())
        .max()
        .unwrap_or(0);
    let col1_w = max_label.min((inner.width as usize).saturating_sub(10));

    let mut lines: Vec<Line> = Vec::new();
    for (section, entries) in &sections {
        if !lines.is_empty() {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(
            format!("{section}:"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (label, keys) in entries {
            let lbl: String = label.chars().take(col1_w).collect();
            let joined = keys.iter().cloned().collect::<Vec<_>>().join(", ");
            lines.push(Line::from(vec![
                Span::raw(format!("  {:>width$} │ ", lbl, width = col1_w)),
                Span::styled(joined, Style::default().add_modifier(Modifier::ITALIC)),
            ]));
        }
    }

    let p = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.text))
        .wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn modal_block<'a>(title: &'a str, app: &AppState) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
}

pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { message } = state {
        // rough wrap estimate so long errors stay readable
        let max_w = area.width.saturating_sub(6).max(30);
        let width = 60u16.min(max_w);
        let inner_w = width.saturating_sub(4).max(10) as usize;
        let approx_lines: usize = message
            .lines()
            .map(|l| l.chars().count().div_ceil(inner_w).max(1))
            .sum();
        let max_h = area.height.saturating_sub(6).max(5);
        let height = (approx_lines as u16 + 4).clamp(5, max_h);
        let rect = centered_rect(width, height, area);
        let p = Paragraph::new(message.clone())
            .wrap(Wrap { trim: false })
            .block(modal_block("Info", app));
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

/// Checkbox list of the values of one filterable column.
pub fn render_filter_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::FilterMenu { column, selected } = state {
        let options = app.filter_options.for_column(*column);
        let width = 52u16.min(area.width.saturating_sub(4)).max(30);
        let height = 16u16.min(area.height.saturating_sub(2)).max(6);
        let rect = centered_rect(width, height, area);
        let visible = height.saturating_sub(4) as usize;
        let offset = selected.saturating_sub(visible.saturating_sub(1));

        let mut lines: Vec<Line> = Vec::new();
        if options.is_empty() {
            lines.push(Line::styled(
                "  (no values)",
                Style::default().fg(app.theme.muted),
            ));
        }
        for (idx, opt) in options.iter().enumerate().skip(offset).take(visible) {
            let marker = if idx == *selected { "▶" } else { " " };
            let checkbox = if app.filters.contains(&opt.value) { "[x]" } else { "[ ]" };
            let style = if idx == *selected {
                Style::default().fg(app.theme.highlight_fg)
            } else {
                Style::default().fg(app.theme.text)
            };
            lines.push(Line::styled(format!("{marker} {checkbox} {}", opt.text), style));
        }
        lines.push(Line::styled(
            "Space: toggle  Tab: column  c: clear  Esc: close",
            Style::default().fg(app.theme.muted),
        ));

        let title = format!("Filter: {}", column.title());
        let p = Paragraph::new(lines).block(modal_block(&title, app));
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

pub fn render_delete_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::DeleteConfirm { selected, ids } = state {
        let rect = centered_rect(50, 7, area);
        let what = match ids.as_slice() {
            [id] => app
                .rows_all
                .iter()
                .find(|r| r.id() == *id)
                .map(|r| format!("division \"{}\"", r.name()))
                .unwrap_or_else(|| format!("division #{id}")),
            _ => format!("{} divisions", ids.len()),
        };
        let button = |idx: usize, label: &str| {
            if idx == *selected {
                Span::styled(
                    format!("[ {label} ]"),
                    Style::default()
                        .fg(app.theme.highlight_fg)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(format!("  {label}  "))
            }
        };
        let lines = vec![
            Line::raw(format!("Delete {what}?")),
            Line::raw(""),
            Line::from(vec![button(0, "Delete"), Span::raw("   "), button(1, "Cancel")]),
        ];
        let p = Paragraph::new(lines).block(modal_block("Confirm delete", app));
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

pub fn render_name_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::NameInput { target, value } = state {
        let rect = centered_rect(56, 6, area);
        let title = match target {
            NameTarget::Create { parent_id: None } => "New division".to_string(),
            NameTarget::Create {
                parent_id: Some(pid),
            } => {
                let parent = app
                    .rows_all
                    .iter()
                    .find(|r| r.id() == *pid)
                    .map(|r| r.name().to_string())
                    .unwrap_or_else(|| format!("#{pid}"));
                format!("New subdivision of {parent}")
            }
            NameTarget::Rename { .. } => "Rename division".to_string(),
        };
        let lines = vec![
            Line::from(vec![
                Span::raw("Name: "),
                Span::styled(
                    format!("{value}▏"),
                    Style::default().fg(app.theme.highlight_fg),
                ),
            ]),
            Line::styled(
                "Enter: save  Esc: cancel",
                Style::default().fg(app.theme.muted),
            ),
        ];
        let p = Paragraph::new(lines).block(modal_block(&title, app));
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}
