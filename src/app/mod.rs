//! Application state types and entry glue.
//!
//! Defines the state of the divisions screen, the theme, the config file
//! locations, and re-exports the event loop as `run`.
//!
pub mod keymap;
pub mod selection;
pub mod update;

use std::path::PathBuf;

use ratatui::style::Color;

use crate::api::DivisionsApi;
use crate::model::{Division, DivisionId, DivisionRow};
use crate::query::{ColumnFilters, FilterColumn, FilterOptions, Sort};
use crate::search::GlobalSearch;

use self::keymap::Keymap;
use self::selection::Selection;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub checked_fg: Color,
}

impl Theme {
    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            checked_fg: Color::Rgb(0xa6, 0xe3, 0xa1),   // green
        }
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key.is_empty() || val.is_empty() {
                continue;
            }
            if let Some(color) = Self::parse_color(val) {
                match key {
                    "text" => theme.text = color,
                    "muted" => theme.muted = color,
                    "title" => theme.title = color,
                    "border" => theme.border = color,
                    "header_bg" => theme.header_bg = color,
                    "header_fg" => theme.header_fg = color,
                    "status_bg" => theme.status_bg = color,
                    "status_fg" => theme.status_fg = color,
                    "highlight_fg" => theme.highlight_fg = color,
                    "highlight_bg" => theme.highlight_bg = color,
                    "checked_fg" => theme.checked_fg = color,
                    _ => {}
                }
            }
        }
        theme
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        None
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# org-divisions theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");

        fn color_to_str(c: Color) -> String {
            match c {
                Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
                Color::Reset => "reset".to_string(),
                other => format!("{:?}", other),
            }
        }

        let mut kv = |k: &str, v: Color| {
            let _ = writeln!(&mut buf, "{} = {}", k, color_to_str(v));
        };
        kv("text", self.text);
        kv("muted", self.muted);
        kv("title", self.title);
        kv("border", self.border);
        kv("header_bg", self.header_bg);
        kv("header_fg", self.header_fg);
        kv("status_bg", self.status_bg);
        kv("status_fg", self.status_fg);
        kv("highlight_fg", self.highlight_fg);
        kv("highlight_bg", self.highlight_bg);
        kv("checked_fg", self.checked_fg);

        std::fs::write(path, buf)
    }

    /// Load from `path`, or write the default theme there if it does not exist yet.
    pub fn load_or_init(path: &str) -> Self {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::warn!(path, error = %e, "could not write default theme");
        }
        t
    }
}

/// Location of a per-user config file such as `theme.conf`.
///
/// Uses the platform config directory (created on demand) and falls back to
/// the working directory when none is available.
pub fn config_file_path(name: &str) -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("", "", "org-divisions") {
        let dir = dirs.config_dir();
        if std::fs::create_dir_all(dir).is_ok() {
            return dir.join(name);
        }
    }
    PathBuf::from(name)
}

/// What a name input modal will do on confirm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameTarget {
    Create { parent_id: Option<DivisionId> },
    Rename { id: DivisionId },
}

/// Modal dialogs on top of the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    FilterMenu {
        column: FilterColumn,
        selected: usize,
    },
    DeleteConfirm {
        selected: usize,
        ids: Vec<DivisionId>,
    },
    NameInput {
        target: NameTarget,
        value: String,
    },
    Info {
        message: String,
    },
}

/// Subdivisions fetched for one division.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subdivisions {
    pub parent_id: DivisionId,
    pub items: Vec<Division>,
}

pub struct AppState {
    pub api: Box<dyn DivisionsApi>,
    pub rows_all: Vec<DivisionRow>,
    pub rows: Vec<DivisionRow>,
    pub selected_index: usize,
    /// Configured page size.
    pub page_size: usize,
    /// Rows per page actually shown; never above `page_size`.
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub search: GlobalSearch,
    /// Text in the header search box.
    pub search_input: String,
    pub seen_search_revision: u64,
    pub filters: ColumnFilters,
    pub filter_options: FilterOptions,
    pub sort: Option<Sort>,
    pub selection: Selection,
    pub subdivisions: Option<Subdivisions>,
    pub loading: bool,
    pub reload_requested: bool,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub show_keybinds: bool,
}

impl AppState {
    /// Fresh state with nothing loaded; a reload is requested for the first frame.
    pub fn new(api: Box<dyn DivisionsApi>) -> Self {
        Self {
            api,
            rows_all: Vec::new(),
            rows: Vec::new(),
            selected_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            rows_per_page: DEFAULT_PAGE_SIZE,
            input_mode: InputMode::Normal,
            search: GlobalSearch::default(),
            search_input: String::new(),
            seen_search_revision: 0,
            filters: ColumnFilters::default(),
            filter_options: FilterOptions::default(),
            sort: None,
            selection: Selection::default(),
            subdivisions: None,
            loading: true,
            reload_requested: true,
            theme: Theme::mocha(),
            keymap: Keymap::default(),
            modal: None,
            show_keybinds: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self.rows_per_page = self.page_size;
        self
    }

    pub fn selected_row(&self) -> Option<&DivisionRow> {
        self.rows.get(self.selected_index)
    }

    pub fn total_collaborators(&self) -> u64 {
        crate::model::total_collaborators(&self.rows_all)
    }

    /// Zero-based page of the cursor and the page count (at least 1).
    pub fn page(&self) -> (usize, usize) {
        let rpp = self.rows_per_page.max(1);
        let pages = self.rows.len().div_ceil(rpp).max(1);
        (self.selected_index / rpp, pages)
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.modal = Some(ModalState::Info {
            message: message.into(),
        });
        self.input_mode = InputMode::Modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
