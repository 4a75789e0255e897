//! Screen layout: header with the search box, divisions table, side panes,
//! status bar, and modals on top.
//!
pub mod components;
pub mod divisions;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(root[1]);

    render_header(f, root[0], app);

    divisions::render_divisions_table(f, body[0], app);
    if app.show_keybinds {
        components::render_keybinds_panel(f, body[1], app);
    } else {
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(5)])
            .split(body[1]);
        divisions::render_division_details(f, right[0], app);
        divisions::render_subdivisions(f, right[1], app);
    }

    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let editing = app.input_mode == InputMode::Search;
    let search_text = if editing {
        format!("{}▏", app.search_input)
    } else if app.search.is_active() {
        app.search.term().to_string()
    } else {
        "press / to search".to_string()
    };
    let search_style = if editing {
        Style::default()
            .fg(app.theme.highlight_fg)
            .add_modifier(Modifier::BOLD)
    } else if app.search.is_active() {
        Style::default().fg(app.theme.text)
    } else {
        Style::default().fg(app.theme.muted)
    };
    let line = Line::from(vec![
        Span::styled("Search: ", Style::default().fg(app.theme.header_fg)),
        Span::styled(search_text, search_style),
        Span::raw("    "),
        Span::styled(
            format!("Total collaborators: {}", app.total_collaborators()),
            Style::default()
                .fg(app.theme.header_fg)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    let p = Paragraph::new(line)
        .block(
            Block::default()
                .title("org-divisions")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().bg(app.theme.header_bg));
    f.render_widget(p, area);
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(state) = app.modal.as_ref() else {
        return;
    };
    match state {
        ModalState::Info { .. } => components::render_info_modal(f, area, app, state),
        ModalState::FilterMenu { .. } => components::render_filter_modal(f, area, app, state),
        ModalState::DeleteConfirm { .. } => components::render_delete_modal(f, area, app, state),
        ModalState::NameInput { .. } => components::render_name_modal(f, area, app, state),
    }
}
