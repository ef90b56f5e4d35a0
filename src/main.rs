use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use musicswap::backend::{PlaybackBackend, RecordingBackend};
use musicswap::{
    ensure_music_dir, Config, DirectoryLoader, FrameScript, ScriptedBridge, Session, TrackCache,
};

#[derive(Parser, Debug)]
#[command(
    name = "musicswap",
    version,
    about = "Replace sequenced game music with external audio tracks"
)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Music directory (overrides the configuration)
    #[arg(short, long, global = true)]
    music_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List cached tracks and how their names parse
    List,
    /// Replay a frame script through the substitution engine
    Run {
        /// Frame script (JSON)
        script: PathBuf,
        /// Emulated frame rate used for pacing
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Print backend commands instead of playing audio
        #[arg(long)]
        dry_run: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.music_dir {
        config.music_dir = dir.clone();
    }
    Ok(config)
}

fn load_cache(config: &Config) -> Result<Arc<TrackCache>> {
    ensure_music_dir(&config.music_dir)?;
    let cache = Arc::new(TrackCache::new());
    let loaded = DirectoryLoader::new(&config.music_dir)
        .load_into(&cache)
        .with_context(|| format!("loading tracks from {}", config.music_dir.display()))?;
    tracing::info!("{} music tracks cached", loaded);
    Ok(cache)
}

fn list(config: &Config) -> Result<()> {
    let cache = load_cache(config)?;
    println!("{} track(s) in {}", cache.len(), config.music_dir.display());
    for track in &cache.all() {
        match track.key() {
            Ok(key) => {
                let looping = match (key.looping, key.loop_region) {
                    (true, Some(r)) => format!("loop {:.3}s..{:.3}s", r.start, r.end),
                    (true, None) => "loop".to_string(),
                    (false, _) => "once".to_string(),
                };
                println!(
                    "  {:<32} id {:#04x}  {:<24} {} bytes",
                    track.name(),
                    key.id,
                    looping,
                    track.buffer().len()
                );
            }
            Err(e) => println!("  {:<32} unmatchable: {}", track.name(), e),
        }
    }
    Ok(())
}

fn replay<B: PlaybackBackend>(
    config: &Config,
    cache: Arc<TrackCache>,
    backend: B,
    script: &Path,
    frame_time: Option<Duration>,
) -> Result<Session<B>> {
    let script = FrameScript::load(script)
        .with_context(|| format!("loading frame script {}", script.display()))?;
    let mut bridge = ScriptedBridge::new(script);
    let mut session = Session::new(config, cache, backend);

    let started = Instant::now();
    while bridge.advance() {
        session.on_tick(&mut bridge);
        if let Some(frame_time) = frame_time {
            let due = frame_time * session.frame() as u32;
            if let Some(wait) = due.checked_sub(started.elapsed()) {
                std::thread::sleep(wait);
            }
        }
    }

    tracing::info!(
        frames = session.frame(),
        mute_passes = session.muter().passes(),
        "Script finished"
    );
    Ok(session)
}

/// Replays the script against the audio device; false if output is unavailable
#[cfg(feature = "streaming")]
fn run_live(config: &Config, cache: Arc<TrackCache>, script: &Path, fps: u32) -> Result<bool> {
    let backend = musicswap::RodioBackend::new()?;
    let frame_time = Duration::from_secs(1) / fps.max(1);
    replay(config, cache, backend, script, Some(frame_time))?;
    Ok(true)
}

#[cfg(not(feature = "streaming"))]
fn run_live(_config: &Config, _cache: Arc<TrackCache>, _script: &Path, _fps: u32) -> Result<bool> {
    eprintln!(
        "Audio output requires the \"streaming\" feature; showing backend commands instead."
    );
    Ok(false)
}

fn run(config: &Config, script: &Path, fps: u32, dry_run: bool) -> Result<()> {
    let cache = load_cache(config)?;
    if !dry_run && run_live(config, Arc::clone(&cache), script, fps)? {
        return Ok(());
    }

    let session = replay(config, cache, RecordingBackend::new(), script, None)?;
    for command in session.engine().backend().commands() {
        println!("{}", command);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::List => list(&config),
        Command::Run {
            script,
            fps,
            dry_run,
        } => run(&config, script, *fps, *dry_run),
    }
}
