//! Console recitation player.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Load the content library and pick the requested surah.
//! - Wire the playback façade, sync engine and store together and drive
//!   them one tick at a time until the recitation ends.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::thread;
use std::time::Duration;
use tilawa::format::{format_duration_latin, format_speed, join_display_numbers};
use tilawa::player::{PlaybackFacade, TransportEvent};
use tilawa::sync::Transport;
use tilawa::{SyncEngine, Store, load_config, load_library};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let (surah_id, data_override) = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());

    let data_path = data_override.unwrap_or_else(|| PathBuf::from(&config.data_path));
    let library = load_library(&data_path)?;
    let surah = library
        .surah(surah_id)
        .ok_or_else(|| anyhow!("Surah {surah_id} not found in {}", data_path.display()))?;
    let audio_url = surah
        .audio_url
        .clone()
        .ok_or_else(|| anyhow!("Surah {surah_id} has no recitation audio"))?;
    info!(
        surah = surah.id,
        name = %surah.name_arabic,
        verses = surah.verses.len(),
        speed = %format_speed(config.default_speed),
        "Starting recitation"
    );

    let store = Store::new();
    let facade = Arc::new(PlaybackFacade::new(store.clone(), config.cache_audio));
    facade.set_speed(config.default_speed);
    facade.set_volume(config.default_volume);

    let mut engine = SyncEngine::new(Arc::clone(&facade) as Arc<dyn Transport>);
    let display_numbers: Vec<u32> = surah.verses.iter().map(|v| v.display_number).collect();
    let callback_surah = surah.id;
    engine.bind(&surah.verses, move |active| {
        if active.is_empty() {
            info!(surah = callback_surah, "No verse active");
            return;
        }
        let numbers: Vec<u32> = active
            .iter()
            .filter_map(|&i| display_numbers.get(i).copied())
            .collect();
        info!(
            surah = callback_surah,
            verses = %join_display_numbers(&numbers),
            "Reciting"
        );
    });

    facade.load(&format!("surah-{surah_id}"), &audio_url, surah.audio_duration);
    facade.play();

    let running = Arc::new(AtomicBool::new(true));
    let running_in_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_in_handler.store(false, Ordering::SeqCst);
    })
    .context("Installing interrupt handler")?;

    let commands = spawn_stdin_reader();
    info!("Controls: p play/pause, f/b skip, m mute, q quit");

    let tick = Duration::from_millis(config.tick_interval_ms.max(1));
    'playback: while running.load(Ordering::SeqCst) {
        while let Ok(line) = commands.try_recv() {
            match line.trim() {
                "p" => facade.toggle(),
                "f" => facade.skip(config.skip_seconds),
                "b" => facade.skip(-config.skip_seconds),
                "m" => facade.toggle_mute(),
                "q" => break 'playback,
                "" => {}
                other => warn!(command = other, "Unknown command"),
            }
        }
        facade.tick();
        for event in facade.take_events() {
            engine.handle_transport(&event);
            match event {
                TransportEvent::LoadedMetadata { duration } => {
                    facade.bind_markers(engine.markers(duration));
                    info!(duration = %format_duration_latin(duration), "Recitation ready");
                }
                TransportEvent::Ended => {
                    info!("Recitation finished");
                    break 'playback;
                }
                _ => {}
            }
        }
        engine.tick();
        thread::sleep(tick);
    }
    if !running.load(Ordering::SeqCst) {
        warn!(
            position = %format_duration_latin(facade.position()),
            "Interrupted; stopping playback"
        );
        facade.pause();
    }
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn parse_args() -> Result<(u32, Option<PathBuf>)> {
    let mut args = env::args().skip(1);
    let surah_id = args
        .next()
        .ok_or_else(|| anyhow!("Usage: tilawa <surah-id> [data.json]"))?
        .parse::<u32>()
        .context("Surah id must be a number")?;
    let data_path = args.next().map(PathBuf::from);
    if let Some(path) = &data_path {
        if !path.exists() {
            return Err(anyhow!("File not found: {}", path.display()));
        }
    }
    Ok((surah_id, data_path))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
