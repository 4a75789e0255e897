//! Divisions table, details panel and subdivisions list.
//!
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::app::AppState;
use crate::app::selection::CheckState;
use crate::query::{FilterColumn, SortKey, SortOrder};

/// Header label with sort arrow and filter marker.
fn column_label(app: &AppState, label: &str, key: SortKey, filter: Option<FilterColumn>) -> String {
    let arrow = match app.sort {
        Some(s) if s.key == key => match s.order {
            SortOrder::Ascend => " ▲",
            SortOrder::Descend => " ▼",
        },
        _ => "",
    };
    let funnel = match filter {
        Some(col) if app.filters.is_active(col) => " *",
        _ => "",
    };
    format!("{label}{arrow}{funnel}")
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

/// Render one page of the visible rows around the cursor.
pub fn render_divisions_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height.min(app.page_size.max(1));
    }

    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(app.rows.len());
    let slice = &app.rows[start..end];

    let rows = slice.iter().enumerate().map(|(i, r)| {
        let absolute_index = start + i;
        let checked = app.selection.is_checked(r.id());
        let mut style = if checked {
            Style::default().fg(app.theme.checked_fg)
        } else {
            Style::default().fg(app.theme.text)
        };
        if absolute_index == app.selected_index {
            style = style
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD);
        }
        Row::new(vec![
            Cell::from(checkbox(checked)),
            Cell::from(r.name().to_string()),
            Cell::from(r.parent_name_or_empty().to_string()),
            Cell::from(r.division.level.to_string()),
            Cell::from(r.division.collaborators_count.to_string()),
            Cell::from(r.subdivision_count.to_string()),
            Cell::from(r.division.ambassador_full_name.clone().unwrap_or_default()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(24),
        Constraint::Percentage(22),
        Constraint::Length(8),
        Constraint::Length(16),
        Constraint::Length(15),
        Constraint::Percentage(30),
    ];

    let all_box = match app.selection.check_state(&app.rows_all) {
        CheckState::All => "[x]",
        CheckState::Partial => "[-]",
        CheckState::None => "[ ]",
    };
    let header = Row::new(vec![
        all_box.to_string(),
        column_label(app, "DIVISION", SortKey::Name, Some(FilterColumn::Name)),
        column_label(app, "PARENT", SortKey::ParentName, Some(FilterColumn::ParentName)),
        column_label(app, "LEVEL", SortKey::Level, Some(FilterColumn::Level)),
        column_label(app, "COLLABORATORS", SortKey::Collaborators, None),
        column_label(app, "SUBDIVISIONS", SortKey::Subdivisions, None),
        "AMBASSADOR".to_string(),
    ])
    .style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );

    let (page, pages) = app.page();
    let mut title = format!(
        "Divisions {}/{} - page {}/{}",
        app.rows.len(),
        app.rows_all.len(),
        page + 1,
        pages
    );
    if app.loading {
        title.push_str(" (loading...)");
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

pub fn render_division_details(f: &mut Frame, area: Rect, app: &AppState) {
    let text = match app.selected_row() {
        Some(r) => {
            let d = &r.division;
            format!(
                "Name: {}\nParent: {}\nAmbassador: {}\nLevel: {}\nCollaborators: {}\nSubdivisions: {}\nCreated: {}\nUpdated: {}",
                d.name,
                r.parent_name.as_deref().unwrap_or("-"),
                d.ambassador_full_name.as_deref().unwrap_or("-"),
                d.level,
                d.collaborators_count,
                r.subdivision_count,
                d.created_at.format("%Y-%m-%d %H:%M"),
                d.updated_at.format("%Y-%m-%d %H:%M"),
            )
        }
        None if app.loading => "Loading divisions...".to_string(),
        None => "No division selected".to_string(),
    };
    let p = Paragraph::new(text)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

/// Subdivisions fetched for the focused row; a hint when nothing was fetched for it.
pub fn render_subdivisions(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Subdivisions")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    let focused = app.selected_row().map(|r| r.id());
    let fetched = app
        .subdivisions
        .as_ref()
        .filter(|s| Some(s.parent_id) == focused);
    let Some(subs) = fetched else {
        let p = Paragraph::new("Enter: load subdivisions")
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    };
    if subs.items.is_empty() {
        let p = Paragraph::new("No subdivisions")
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let rows = subs.items.iter().map(|d| {
        Row::new(vec![
            Cell::from(d.name.clone()),
            Cell::from(d.level.to_string()),
            Cell::from(d.collaborators_count.to_string()),
        ])
        .style(Style::default().fg(app.theme.text))
    });
    let widths = [
        Constraint::Percentage(60),
        Constraint::Length(6),
        Constraint::Length(8),
    ];
    let header = Row::new(vec!["NAME", "LEVEL", "PEOPLE"]).style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}
