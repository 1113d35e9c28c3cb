mod activities;
mod api;
mod calendar;
mod config;
mod logging;
mod models;
mod planning;
mod tui;
mod validate;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

use api::TripClient;
use config::Config;
use tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Point api_url at your trip planner server, then run planner-tui.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("planner-tui: plan trips with your friends from the terminal");
        println!();
        println!("USAGE:");
        println!("  planner-tui                 Plan a new trip");
        println!("  planner-tui <trip-id>       Open an existing trip");
        println!("  planner-tui --trip <id>     Same as above");
        println!("  planner-tui --init          Generate a default config file");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/planner-tui/config.toml");
        println!("  Env:  PLANNER_API_URL, PLANNER_TIMEZONE, PLANNER_LOCALE");
        println!("  Logs: RUST_LOG overrides log_level");
        println!();
        println!("KEYBINDINGS:");
        println!("  Tab / Shift+Tab     Next / previous field or tab");
        println!("  Enter               Open calendar, confirm, or go to next field");
        println!("  Ctrl+S              Submit the current form");
        println!("  j / k / Up / Down   Navigate lists");
        println!("  n / e / a / d       New activity, edit trip, add, delete");
        println!("  Esc                 Close popup");
        println!("  q / Ctrl+C          Quit");
        return Ok(());
    }

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `planner-tui --init` to generate a config file,\n\
         or set the PLANNER_API_URL environment variable."
    })?;

    let log_path = logging::init_tracing(&config.log_level)?;
    tracing::info!(log = %log_path.display(), api_url = %config.api_url, "starting planner-tui");

    let client = TripClient::new(&config.api_url)?;
    let mut app = App::new(client, config.zone()?, config.locale()?);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if let Some(trip_id) = trip_id_arg(&args) {
        app.open_trip(&trip_id);
    }
    let result = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "planner-tui exited with an error");
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

/// `<trip-id>` or `--trip <trip-id>`; other flags are ignored.
fn trip_id_arg(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--trip" {
            return iter.next().cloned();
        }
        if !arg.starts_with('-') {
            return Some(arg.clone());
        }
    }
    None
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.frame_count = app.frame_count.wrapping_add(1);
        terminal.draw(|f| tui::ui::render(f, app))?;

        if let Some(Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        })) = tui::event::poll_event(Duration::from_millis(100))?
        {
            tui::event::handle_key(app, code, modifiers);
        }

        if !app.running {
            break;
        }

        // Apply a completed request without blocking.
        app.poll_request();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn trip_id_from_args() {
        assert_eq!(trip_id_arg(&args(&[])), None);
        assert_eq!(trip_id_arg(&args(&["abc-123"])), Some("abc-123".into()));
        assert_eq!(trip_id_arg(&args(&["--trip", "abc"])), Some("abc".into()));
        assert_eq!(trip_id_arg(&args(&["--trip"])), None);
    }
}
