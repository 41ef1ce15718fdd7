use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use schulte::{
    app::{App, Control},
    app_dirs::AppDirs,
    clipboard::{DisabledClipboard, SummarySink, SystemClipboard},
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, GridEvent, GridEventSource, Runner, Ticker},
    session::ROUND_SIZES,
    summary::SessionSummary,
    ui::format_secs,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Instant,
};
use tracing::info;

/// number-grid focus puzzle: pick 1..n² in order on 3x3, 4x4 and 5x5 grids
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A Schulte-table focus drill for the terminal. Pick the numbers in ascending order on three grids of growing size; time and mistakes per grid are summarised in a short code copied to the clipboard at the end."
)]
pub struct Cli {
    /// seed for the grid shuffle (same seed, same grids)
    #[clap(long)]
    seed: Option<u64>,

    /// pause in milliseconds between clearing a grid and the next one
    #[clap(long)]
    delay_ms: Option<u64>,

    /// how long a wrong pick stays highlighted, in milliseconds
    #[clap(long)]
    flash_ms: Option<u64>,

    /// do not copy the summary code to the clipboard
    #[clap(long)]
    no_clipboard: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// decode a summary code, print it and exit
    #[clap(long, value_name = "CODE")]
    decode: Option<String>,
}

impl Cli {
    /// Command-line flags win over the config file
    fn apply(&self, cfg: &mut Config) {
        if let Some(seed) = self.seed {
            cfg.seed = Some(seed);
        }
        if let Some(ms) = self.delay_ms {
            cfg.completion_delay_ms = ms;
        }
        if let Some(ms) = self.flash_ms {
            cfg.error_flash_ms = ms;
        }
        if self.no_clipboard {
            cfg.copy_to_clipboard = false;
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn render_decoded(summary: &SessionSummary) -> String {
    let mut out = format!("{:<6}{:>8}{:>8}\n", "grid", "time", "errors");
    for size in ROUND_SIZES {
        let r = summary.round(size).unwrap_or_default();
        out.push_str(&format!(
            "{:<6}{:>8}{:>8}\n",
            format!("{size}x{size}"),
            format_secs(r.elapsed_secs),
            r.error_count
        ));
    }
    out.push_str(&format!(
        "{:<6}{:>8}{:>8}\n",
        "total",
        format_secs(summary.total_secs()),
        summary.total_errors()
    ));
    out
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(code) = &cli.decode {
        match SessionSummary::decode(code) {
            Ok(summary) => {
                print!("{}", render_decoded(&summary));
                return Ok(());
            }
            Err(err) => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
            }
        }
    }

    let store = cli.config_store();
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save_config {
        store.save(&config)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        // logging is optional; a read-only state dir must not stop the game
        let _ = logging::init_file_logging(&path);
    }
    info!(?config, "starting");

    let mut sink: Box<dyn SummarySink> = if config.copy_to_clipboard {
        Box::new(SystemClipboard::new())
    } else {
        Box::new(DisabledClipboard)
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, &runner, sink.as_mut());

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: GridEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    sink: &mut dyn SummarySink,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let now = Instant::now();
        match runner.step() {
            GridEvent::Tick => {
                app.on_tick(now, sink);
            }
            GridEvent::Resize => {}
            GridEvent::Key(key) => {
                if app.on_key(key, now) == Control::Quit {
                    info!("quit");
                    break;
                }
            }
            GridEvent::Mouse(mouse) => {
                let size = terminal.size()?;
                app.on_mouse(mouse, Rect::new(0, 0, size.width, size.height), now);
            }
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
