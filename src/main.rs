use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::info;

use tailspeed::data::duration::parse_duration;
use tailspeed::data::Thresholds;
use tailspeed::monitor::{handoff, SpeedUpdate};
use tailspeed::{
    events, logging, ui, App, Clock, FileSource, LiveSource, Monitor, MonitorConfig,
    OutputFormat, Reporter, RunSummary, StreamSource,
};

/// Log file used in dashboard mode when `--log-file` is not given.
const DEFAULT_LOG_FILE: &str = "tailspeed.log";

/// Updates buffered between the monitor thread and the dashboard.
const HANDOFF_CAPACITY: usize = 256;

type Worker = JoinHandle<tailspeed::error::Result<RunSummary>>;

#[derive(Parser, Debug)]
#[command(name = "tailspeed")]
#[command(about = "Live lines-per-second monitor for timestamped log files")]
struct Args {
    /// Log file to follow, or `-` to read stdin
    path: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print one record per measurement instead of the dashboard
    #[arg(long)]
    plain: bool,

    /// Record format for --plain
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Read the file's existing content before following it
    #[arg(long)]
    from_start: bool,

    /// Averaging interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Number of measurements kept for averages
    #[arg(long)]
    window: Option<usize>,

    /// Sleep between empty reads (e.g., "100ms")
    #[arg(long)]
    poll: Option<String>,

    /// Give up after this many chunks without a timestamp
    #[arg(long)]
    max_init_retries: Option<u64>,

    /// Report the group in progress when the source ends
    #[arg(long)]
    flush_on_close: bool,

    /// Compare log timestamps against UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Silence before the feed is flagged as a warning (e.g., "5s")
    #[arg(long, default_value = "5s")]
    stall_warn: String,

    /// Silence before the feed is flagged as critical (e.g., "30s")
    #[arg(long, default_value = "30s")]
    stall_crit: String,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file (dashboard mode defaults to tailspeed.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn reads_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    /// Layer command-line flags over the loaded configuration.
    fn apply_to(&self, config: &mut MonitorConfig) -> Result<()> {
        if let Some(interval) = self.interval {
            config.average_interval = interval;
        }
        if let Some(window) = self.window {
            config.window_capacity = window;
        }
        if let Some(ref poll) = self.poll {
            config.poll_interval =
                parse_duration(poll).with_context(|| format!("Invalid --poll value: {}", poll))?;
        }
        if self.max_init_retries.is_some() {
            config.max_init_retries = self.max_init_retries;
        }
        if self.flush_on_close {
            config.flush_on_close = true;
        }
        if self.utc {
            config.clock = Clock::Utc;
        }
        config.validate()?;
        Ok(())
    }

    fn thresholds(&self) -> Result<Thresholds> {
        let stall_warning = parse_duration(&self.stall_warn)
            .with_context(|| format!("Invalid --stall-warn value: {}", self.stall_warn))?;
        let stall_critical = parse_duration(&self.stall_crit)
            .with_context(|| format!("Invalid --stall-crit value: {}", self.stall_crit))?;
        Ok(Thresholds {
            stall_warning,
            stall_critical,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MonitorConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply_to(&mut config)?;
    let thresholds = args.thresholds()?;

    // The dashboard owns the terminal, so its logs go to a file
    let log_file = match (&args.log_file, args.plain) {
        (Some(path), _) => Some(path.clone()),
        (None, false) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        (None, true) => None,
    };
    logging::init_logging(&args.log_level, log_file.as_deref())?;

    // Stdin is read by a task on this runtime; it must outlive the monitor
    let runtime = if args.reads_stdin() {
        Some(Runtime::new()?)
    } else {
        None
    };

    let source: Box<dyn LiveSource> = match runtime {
        Some(ref rt) => {
            let _guard = rt.enter();
            Box::new(StreamSource::spawn(tokio::io::stdin(), "stdin"))
        }
        None => Box::new(open_file(&args.path, args.from_start)?),
    };

    let monitor = Monitor::new(source, config);

    let result = if args.plain {
        run_plain(monitor, args.format)
    } else {
        run_tui(monitor, thresholds)
    };

    // The stdin reader blocks until upstream writes again; don't wait for it
    if let Some(rt) = runtime {
        rt.shutdown_background();
    }
    result
}

fn open_file(path: &Path, from_start: bool) -> Result<FileSource> {
    let source = if from_start {
        FileSource::open_from_start(path)
    } else {
        FileSource::open(path)
    };
    source.with_context(|| format!("Failed to open {}", path.display()))
}

/// Print one record per measurement on stdout.
fn run_plain(mut monitor: Monitor<Box<dyn LiveSource>>, format: OutputFormat) -> Result<()> {
    let interval = monitor.config().average_interval;
    let mut reporter = Reporter::new(format, io::stdout().lock(), interval);
    let mut write_error = None;

    let summary = monitor.run_with(|session, measurement| {
        let update = SpeedUpdate {
            measurement: *measurement,
            average: session.average_speed(interval),
        };
        if let Err(e) = reporter.report(&update) {
            write_error = Some(e);
            session.stop();
        }
    })?;

    match write_error {
        // Reader went away (e.g. piped into head)
        Some(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
        Some(e) => Err(e).context("Failed to write measurement"),
        None => {
            info!(measurements = summary.measurements, "Done");
            Ok(())
        }
    }
}

/// Run the dashboard with the monitor on its own thread.
fn run_tui(monitor: Monitor<Box<dyn LiveSource>>, thresholds: Thresholds) -> Result<()> {
    let interval = monitor.config().average_interval;
    let description = monitor.source_description().to_string();
    let handle = monitor.handle();
    let (mut observer, receiver) = handoff::bounded(HANDOFF_CAPACITY, interval);

    let mut monitor = monitor;
    let worker = thread::Builder::new()
        .name("monitor".to_string())
        .spawn(move || monitor.run_with(|session, m| observer.observe(session, m)))
        .context("Failed to start monitor thread")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(handle.clone(), receiver, &description, interval, thresholds);
    let mut worker = Some(worker);

    let result = run_app(&mut terminal, &mut app, &mut worker);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    handle.stop();
    let outcome = match worker {
        Some(worker) => join_worker(worker),
        None => app.finished.take().unwrap_or_else(|| Err("monitor state lost".to_string())),
    };

    result?;
    match outcome {
        Ok(summary) => {
            println!(
                "{}: {} measurements, {} lines ({} without timestamp)",
                description, summary.measurements, summary.lines_seen, summary.lines_skipped
            );
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Monitor failed: {}", e)),
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    worker: &mut Option<Worker>,
) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    while app.running {
        // Collect the outcome once the monitor thread is done, then pick up
        // whatever it sent before exiting
        if worker.as_ref().is_some_and(|w| w.is_finished()) {
            if let Some(w) = worker.take() {
                app.set_finished(join_worker(w));
            }
        }
        app.refresh();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(12),   // Dashboard
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::dashboard::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }

    Ok(())
}

fn join_worker(worker: Worker) -> std::result::Result<RunSummary, String> {
    match worker.join() {
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("monitor thread panicked".to_string()),
    }
}
