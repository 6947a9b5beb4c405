mod app;

use anyhow::{Context, Result};
use app::App;
use blockshift_config::Config;
use crossterm::{
    cursor::Show,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env, fs,
    io::{Stdout, Write, stdout},
    path::{Path, PathBuf},
    process,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <markdown-file>", args[0]);
        process::exit(1);
    }
    let path = PathBuf::from(&args[1]);

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    // The terminal is in raw mode while running, so logs go to a file
    let log_file = config.log_file();
    init_logging(&log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
    log::info!("blockshift starting on {}", path.display());

    let source = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut app = App::new(path, &source, config.drag);

    // Setup terminal; the guard restores it on every exit path from here on
    enable_raw_mode()?;
    let guard = TerminalGuard;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    drop(guard);

    if app.is_dirty() {
        eprintln!("Quit with unsaved changes");
    }
    if let Err(err) = res {
        log::error!("{err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn init_logging(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Leaves raw mode and the alternate screen when dropped
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal(&mut stdout());
    }
}

fn restore_terminal<W: Write>(out: &mut W) {
    if let Err(err) = disable_raw_mode() {
        log::warn!("failed to leave raw mode: {err}");
    }
    if let Err(err) = execute!(
        out,
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange,
        Show
    ) {
        log::warn!("failed to restore terminal: {err}");
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.draw(f))?;
        app.after_draw();

        if app.handle_event(event::read()?) {
            return Ok(());
        }
    }
}
