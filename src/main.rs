use clap::Parser;
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use lscan::{build_app, AppConfig, AppEvent, Args, CacheManager, ConfigManager, APP_NAME};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut lscan::App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: &AppConfig) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let mut app = build_app(tx.clone(), config, args)?;
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Refresh)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Mouse(mouse) => tx.send(AppEvent::Mouse(mouse))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(config) => match config.write_default_config(args.force) {
                Ok(path) => {
                    println!("Wrote default configuration to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error generating config: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

/// Config from disk, or the defaults if it cannot be read or is invalid.
fn load_config() -> AppConfig {
    match AppConfig::load(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring configuration: {}", e);
            AppConfig::default()
        }
    }
}

fn log_level<'a>(args: &Args, config: &'a AppConfig) -> &'a str {
    if args.debug {
        "debug"
    } else {
        &config.debug.log_level
    }
}

fn log_path(args: &Args) -> Option<PathBuf> {
    args.log_file.clone().or_else(|| {
        CacheManager::new(APP_NAME)
            .ok()
            .map(|cache| cache.log_file())
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = load_config();
    if let Some(path) = log_path(&args) {
        if let Err(e) = lscan::logging::init(&path, log_level(&args, &config)) {
            eprintln!("Warning: logging disabled: {}", e);
        }
    }

    let terminal = ratatui::init();
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
    let result = run(terminal, &args, &config);
    let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    if let Err(e) = result {
        log::error!("exiting with error: {:#}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_raises_log_level() {
        let config = AppConfig::default();
        let args = Args {
            debug: true,
            ..Args::default()
        };
        assert_eq!(log_level(&args, &config), "debug");
        assert_eq!(log_level(&Args::default(), &config), "info");
    }

    #[test]
    fn test_explicit_log_file_wins() {
        let args = Args {
            log_file: Some(PathBuf::from("/tmp/lscan-test.log")),
            ..Args::default()
        };
        assert_eq!(log_path(&args), Some(PathBuf::from("/tmp/lscan-test.log")));
    }
}
