use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use dirview::app::App;
use dirview::config::{AppConfig, GeneralConfig, LogConfig, TreeConfig, WatcherConfig};
use dirview::error::{AppError, Result};
use dirview::event::{Event, EventHandler};
use dirview::fs::watcher::{FsWatcher, DEFAULT_FLOOD_THRESHOLD};
use dirview::handler;
use dirview::logging;
use dirview::tui::{install_panic_hook, Tui};

/// Dir View
#[derive(Parser, Debug)]
#[command(name = "dirview", version, about = "Dir View")]
struct Cli {
    /// The directory to start in (defaults to your home directory)
    directory: Option<PathBuf>,

    /// Use plain ASCII markers instead of folder icons
    #[arg(short = 'c', long)]
    dont_use_custom_directory_icons: bool,

    /// Don't watch the file system for changes
    #[arg(short = 'w', long)]
    dont_watch: bool,

    /// Config file to load on top of the default locations
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags expressed as a partial config that wins over every file.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: self
                    .directory
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                ..Default::default()
            },
            tree: TreeConfig {
                use_icons: self.dont_use_custom_directory_icons.then_some(false),
                ..Default::default()
            },
            watcher: WatcherConfig {
                enabled: self.dont_watch.then_some(false),
                ..Default::default()
            },
            log: LogConfig {
                file: self
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Resolve and validate the start directory.
fn resolve_start_dir(configured: Option<PathBuf>) -> Result<PathBuf> {
    let path = configured
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let canonical = path
        .canonicalize()
        .map_err(|_| AppError::InvalidPath(format!("{} does not exist", path.display())))?;
    if !canonical.is_dir() {
        return Err(AppError::InvalidPath(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(canonical)
}

fn start_watcher(
    root: &Path,
    config: &AppConfig,
    app: &mut App,
    events: &EventHandler,
) -> Option<FsWatcher> {
    if !config.watcher_enabled() {
        return None;
    }
    match FsWatcher::new(
        root,
        Duration::from_millis(config.debounce_ms()),
        config.ignore_patterns(),
        DEFAULT_FLOOD_THRESHOLD,
        events.sender(),
    ) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "watcher unavailable");
            app.watcher_failed(e.to_string());
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let path = resolve_start_dir(config.default_path())?;
    logging::init(config.log_file().as_deref(), config.log_level())?;
    tracing::info!(root = %path.display(), "starting");

    install_panic_hook();

    let mut app = App::new(&path, &config)?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    // Set up watches before the terminal is taken over.
    let mut watcher = start_watcher(&path, &config, &mut app, &events);
    if let Some(watcher) = watcher.as_mut() {
        watcher.sync_watches(&app.tree_state.watch_targets());
    }
    let mut tui = Tui::new(config.mouse_enabled())?;

    let result = run(&mut tui, &mut app, &mut events, watcher.as_mut()).await;
    tui.restore()?;
    tracing::info!("exiting");
    result
}

async fn run(
    tui: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    mut watcher: Option<&mut FsWatcher>,
) -> Result<()> {
    while !app.should_quit {
        tui.draw(app)?;

        let event = events.next().await?;
        let tree_may_change = !matches!(event, Event::Tick | Event::Resize(_, _));
        match event {
            Event::Key(key) => handler::handle_key_event(app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(app, mouse),
            Event::Tick | Event::Resize(_, _) => {}
            Event::FsChange(paths) => app.handle_fs_change(paths),
        }

        if let Some(watcher) = watcher.as_deref_mut() {
            if tree_may_change {
                watcher.sync_watches(&app.tree_state.watch_targets());
            }
            if app.watcher_active != watcher.is_active() {
                if app.watcher_active {
                    watcher.resume();
                } else {
                    watcher.pause();
                }
            }
        }
    }
    Ok(())
}
