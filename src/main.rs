//! Analysis TUI - follow a website analysis from the terminal
//!
//! Usage: `analysis-tui [--config <path>] [URL]`. A URL given on the command
//! line is submitted right away; otherwise the app starts at the prompt.

use std::io;
use std::path::PathBuf;

use analysis_tui::app::App;
use analysis_tui::config::AppConfig;
use analysis_tui::logging;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    url: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => match args.next() {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => bail!("{arg} needs a file path"),
            },
            flag if flag.starts_with('-') => bail!("unknown option {flag}"),
            _ if parsed.url.is_some() => bail!("only one URL can be analyzed at a time"),
            _ => parsed.url = Some(arg),
        }
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = parse_args(std::env::args().skip(1))?;
    let config = AppConfig::load(args.config.as_deref()).wrap_err("failed to load configuration")?;
    logging::init(&config)?;

    let mut app = App::new(config)?;

    setup_terminal()?;
    if let Some(url) = &args.url {
        app.submit(url);
    }
    let result = app.run_with_crossterm().await;
    // Restore the terminal before any error gets printed.
    restore_terminal()?;

    result
}

fn setup_terminal() -> Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    Ok(())
}

fn restore_terminal() -> Result<()> {
    crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;
    Ok(())
}
