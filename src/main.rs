//! org-divisions binary entry point.
//!
//! Parses arguments, sets up logging, then either prints a one-shot listing
//! or runs the TUI with the terminal in raw mode, restoring it on exit.
//!
use anyhow::{Result, anyhow};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use org_divisions::app::{self, AppState, Theme, config_file_path, keymap::Keymap};
use org_divisions::cli::{self, Cli, Command};

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn run_tui(args: &Cli) -> Result<()> {
    let api = args.build_api().map_err(|e| anyhow!(e))?;
    tracing::info!(base_url = api.base_url(), "starting TUI");

    let mut state = AppState::new(Box::new(api)).with_page_size(args.page_size);
    state.theme = Theme::load_or_init(&config_file_path("theme.conf").to_string_lossy());
    state.keymap = Keymap::load_or_init(&config_file_path("keybinds.conf").to_string_lossy());

    let mut terminal = init_terminal().map_err(|e| anyhow!("init terminal: {e}"))?;

    let res = app::run(&mut terminal, &mut state);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let list_mode = matches!(args.command, Some(Command::List(_)));
    cli::setup_logging(args.verbose, args.log_file.as_ref(), list_mode).map_err(|e| anyhow!(e))?;

    match &args.command {
        Some(Command::List(list_args)) => {
            let api = args.build_api().map_err(|e| anyhow!(e))?;
            let mut stdout = std::io::stdout().lock();
            cli::run_list(&api, list_args, &mut stdout).map_err(|e| anyhow!(e))?;
        }
        None => {
            if let Err(err) = run_tui(&args) {
                tracing::error!(error = %err, "application error");
                eprintln!("application error: {err}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
