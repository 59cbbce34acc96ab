mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use sakura_map::config::ViewportConfig;
use sakura_map::data;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sakura-map", about = "Cherry-blossom spots on an interactive terminal map")]
struct Args {
    /// Directory holding spots.json and prefectures.geojson
    #[arg(long, env = "SAKURA_MAP_DATA", default_value = "data")]
    data: PathBuf,

    /// Open centred on this spot, selected
    #[arg(long)]
    spot: Option<String>,

    /// JSON file overriding viewport tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs here (RUST_LOG sets the level)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let config = match &args.config {
        Some(path) => ViewportConfig::from_json_file(path)?,
        None => ViewportConfig::default(),
    };
    let (spots, basemap) = data::load_dir(&args.data);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &args, spots, basemap, config);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn run(
    terminal: &mut DefaultTerminal,
    args: &Args,
    spots: data::SpotsData,
    basemap: sakura_map::map::Basemap,
    config: ViewportConfig,
) -> Result<()> {
    let size = terminal.size()?;
    let screen = Rect::new(0, 0, size.width, size.height);
    let mut app = App::new(ui::map_area(screen), spots, basemap, config);

    if let Some(id) = &args.spot {
        app.pin(id)?;
    }

    let mut dirty = true;
    loop {
        if app.tick() || dirty {
            terminal.draw(|frame| ui::render(frame, &app))?;
            dirty = false;
        }

        // ~60fps frame budget; handle everything already queued before
        // the next tick
        if event::poll(Duration::from_millis(16))? {
            dirty |= app.handle_terminal_event(event::read()?)?;
            while event::poll(Duration::ZERO)? {
                dirty |= app.handle_terminal_event(event::read()?)?;
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
