//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Keys are resolved from `(KeyModifiers, KeyCode)` pairs. The config file
//! overrides defaults one binding at a time, so a partial file is fine.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic keyboard actions available on the divisions screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Focus the global search box.
    StartSearch,
    /// Empty the global search term.
    ClearSearch,
    /// Open the column filter menu.
    OpenFilterMenu,
    /// Drop every column filter.
    ClearFilters,
    SortByName,
    SortByParent,
    SortByLevel,
    SortByCollaborators,
    SortBySubdivisions,
    /// Check or uncheck the focused row.
    ToggleCheck,
    /// Check every row, or uncheck all when everything is checked.
    ToggleCheckAll,
    /// Fetch the divisions again.
    Reload,
    /// Create a subdivision under the focused row.
    NewDivision,
    /// Rename the focused row.
    RenameDivision,
    /// Delete checked rows (or the focused row).
    DeleteSelection,
    /// Load subdivisions of the focused row into the side pane.
    ShowSubdivisions,
    /// Toggle the keybindings pane on the right.
    ToggleKeybindsPane,
    MoveUp,
    MoveDown,
    /// Previous page.
    MoveLeftPage,
    /// Next page.
    MoveRightPage,
    /// Ignore this key.
    Ignore,
}

const ACTION_NAMES: [(KeyAction, &str); 23] = [
    (KeyAction::Quit, "Quit"),
    (KeyAction::StartSearch, "StartSearch"),
    (KeyAction::ClearSearch, "ClearSearch"),
    (KeyAction::OpenFilterMenu, "OpenFilterMenu"),
    (KeyAction::ClearFilters, "ClearFilters"),
    (KeyAction::SortByName, "SortByName"),
    (KeyAction::SortByParent, "SortByParent"),
    (KeyAction::SortByLevel, "SortByLevel"),
    (KeyAction::SortByCollaborators, "SortByCollaborators"),
    (KeyAction::SortBySubdivisions, "SortBySubdivisions"),
    (KeyAction::ToggleCheck, "ToggleCheck"),
    (KeyAction::ToggleCheckAll, "ToggleCheckAll"),
    (KeyAction::Reload, "Reload"),
    (KeyAction::NewDivision, "NewDivision"),
    (KeyAction::RenameDivision, "RenameDivision"),
    (KeyAction::DeleteSelection, "DeleteSelection"),
    (KeyAction::ShowSubdivisions, "ShowSubdivisions"),
    (KeyAction::ToggleKeybindsPane, "ToggleKeybindsPane"),
    (KeyAction::MoveUp, "MoveUp"),
    (KeyAction::MoveDown, "MoveDown"),
    (KeyAction::MoveLeftPage, "MoveLeftPage"),
    (KeyAction::MoveRightPage, "MoveRightPage"),
    (KeyAction::Ignore, "Ignore"),
];

/// Mapping from key combinations to [`KeyAction`]s.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Default bindings: arrows and hjkl for navigation, digits for sorting.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('c')), KeyAction::ClearSearch);
        bindings.insert((M::NONE, Char('f')), KeyAction::OpenFilterMenu);
        bindings.insert((M::NONE, Char('F')), KeyAction::ClearFilters);
        bindings.insert((M::SHIFT, Char('F')), KeyAction::ClearFilters);
        bindings.insert((M::NONE, Char('1')), KeyAction::SortByName);
        bindings.insert((M::NONE, Char('2')), KeyAction::SortByParent);
        bindings.insert((M::NONE, Char('3')), KeyAction::SortByLevel);
        bindings.insert((M::NONE, Char('4')), KeyAction::SortByCollaborators);
        bindings.insert((M::NONE, Char('5')), KeyAction::SortBySubdivisions);
        bindings.insert((M::NONE, Char(' ')), KeyAction::ToggleCheck);
        bindings.insert((M::NONE, Char('a')), KeyAction::ToggleCheckAll);
        bindings.insert((M::NONE, Char('r')), KeyAction::Reload);
        bindings.insert((M::NONE, Char('n')), KeyAction::NewDivision);
        bindings.insert((M::NONE, Char('e')), KeyAction::RenameDivision);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Enter), KeyAction::ShowSubdivisions);
        bindings.insert((M::NONE, Char('?')), KeyAction::ToggleKeybindsPane);
        // Navigation
        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Left), KeyAction::MoveLeftPage);
        bindings.insert((M::NONE, Right), KeyAction::MoveRightPage);
        bindings.insert((M::NONE, PageUp), KeyAction::MoveLeftPage);
        bindings.insert((M::NONE, PageDown), KeyAction::MoveRightPage);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('h')), KeyAction::MoveLeftPage);
        bindings.insert((M::NONE, Char('l')), KeyAction::MoveRightPage);
        Self { bindings }
    }

    /// Load from `path`; if it does not exist, write the defaults there and use them.
    pub fn load_or_init(path: &str) -> Self {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(path, error = %e, "could not write default keybindings");
        }
        km
    }

    /// Parse `<Action> = <KeySpec>` lines on top of the defaults.
    ///
    /// The reversed `<KeySpec> = <Action>` form is accepted too. Unknown lines are skipped.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let lhs = parts.next().map(|s| s.trim()).unwrap_or("");
            let rhs = parts.next().map(|s| s.trim()).unwrap_or("");
            if lhs.is_empty() || rhs.is_empty() {
                continue;
            }
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
                continue;
            }
            if let (Some(key), Some(action)) = (parse_key(lhs), parse_action(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        map
    }

    /// Write the current bindings, sorted by action name, with a short header.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# org-divisions keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+r, Enter, Esc, Space, Tab, Up, Down, Left, Right, PageUp, PageDown, Delete, /\n");
        buf.push_str("# Actions: ");
        buf.push_str(
            &ACTION_NAMES
                .iter()
                .map(|(_, n)| *n)
                .collect::<Vec<_>>()
                .join(", "),
        );
        buf.push_str("\n\n");

        let mut lines: Vec<(String, String)> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a != KeyAction::Ignore)
            .map(|((m, c), a)| (format_action(*a).to_string(), Self::format_key(*m, *c)))
            .collect();
        lines.sort();
        for (action, key) in lines {
            let _ = writeln!(&mut buf, "{} = {}", action, key);
        }

        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    pub fn all_bindings(&self) -> Vec<((KeyModifiers, KeyCode), KeyAction)> {
        self.bindings.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Format a key into a spec such as `Ctrl+r`, `Space` or `PageDown`.
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Char(' ') => "Space".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let mut rest = s;
    let mut mods = KeyModifiers::NONE;
    if let Some(after) = s.strip_prefix("Ctrl+") {
        mods |= KeyModifiers::CONTROL;
        rest = after;
    }
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Space" => Char(' '),
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let s = s.trim();
    ACTION_NAMES
        .iter()
        .find(|(_, name)| *name == s)
        .map(|(action, _)| *action)
}

pub fn format_action(a: KeyAction) -> &'static str {
    ACTION_NAMES
        .iter()
        .find(|(action, _)| *action == a)
        .map(|(_, name)| *name)
        .unwrap_or("Ignore")
}
