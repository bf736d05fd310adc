use anyhow::Result;
use area_calc::app::App;
use area_calc::config::{AppConfig, ConfigError};
use area_calc::ui;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::time::Duration;

fn main() -> Result<()> {
    let (config, problem) = AppConfig::load_or_default(&AppConfig::config_path());
    let config = config.with_env();
    let logging = init_logging(&config);
    if let Some(problem) = problem {
        match (&problem, logging) {
            // Nowhere else to report it once the TUI owns the terminal
            (ConfigError::Malformed { .. }, false) => eprintln!("{problem}, using defaults"),
            _ => problem.log(),
        }
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// The terminal owns stdout/stderr, so log lines go to a file.
/// Without a writable log file the app runs unlogged; returns whether logging is on.
fn init_logging(config: &AppConfig) -> bool {
    let file = match File::create(&config.log_file) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot create {}: {e}", config.log_file.display());
            return false;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    true
}

fn run(terminal: &mut DefaultTerminal, config: AppConfig) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, Rect::new(0, 0, size.width, size.height));

    // Main loop
    loop {
        app.tick();

        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key.code),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    log::info!("Exiting");
    Ok(())
}
