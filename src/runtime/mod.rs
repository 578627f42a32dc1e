use std::env;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{info, warn};

use musico::mpris::ControlCmd;

mod console;
mod event_loop;
mod logging;
mod mpris_sync;
mod settings;
mod startup;


pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();

    let arg = env::args().nth(1);
    if arg.as_deref() == Some("--print-config") {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    logging::init_tracing(&settings.logging.level);
    if let Some(problem) = problem {
        warn!("{problem}");
    }

    let dir = arg
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let catalog = startup::build_catalog(&dir, &settings);
    let player = startup::spawn_player(&settings)?;
    let changes = player.view().subscribe();

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = startup::start_mpris(&settings, control_tx);

    let (console_tx, console_rx) = mpsc::channel();
    console::spawn_console(console_tx);

    let inputs = event_loop::Inputs {
        control_rx,
        console_rx,
        changes,
        scan: Some(catalog.scan_in_background()),
    };
    let result = event_loop::EventLoop::new(&settings, catalog.clone(), &player, &mpris).run(inputs);

    info!("quitting");
    player.quit(Duration::from_millis(settings.audio.quit_fade_out_ms));
    result.map_err(Into::into)
}
