//! Zeno Flick headless driver
//!
//! Plays scripted throws through the simulation core and logs what happens.
//! Useful for tuning and for checking determinism across seeds.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::LevelFilter;
use serde::de::DeserializeOwned;

use zeno_flick::Settings;
use zeno_flick::audio::SoundCue;
use zeno_flick::consts::FRAME_DT;
use zeno_flick::sim::{
    DailyStats, FrameHooks, FrameInput, OutcomeEvent, Progress, SessionState, tick,
};
use zeno_flick::throws::{ThrowGrant, ThrowState, format_regen_time};

/// Milliseconds per display frame
const FRAME_MS: f64 = FRAME_DT * 1000.0;
/// Give up on a throw that runs longer than this
const MAX_FRAMES_PER_THROW: u32 = 60 * 60;

/// Play scripted Zeno Flick throws without a display
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of throws to play
    #[arg(short = 'n', long, default_value_t = 5)]
    throws: u32,

    /// Launch angle in degrees
    #[arg(long, default_value_t = 45.0)]
    angle: f64,

    /// How long to hold the charge, in milliseconds
    #[arg(long, default_value_t = 700.0)]
    hold_ms: f64,

    /// Tap for an air float this many ms after launch
    #[arg(long)]
    float_at_ms: Option<f64>,

    /// Settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Progress JSON file, read at start and written at the end
    #[arg(long)]
    progress: Option<PathBuf>,

    /// Throw economy JSON file, read at start and written at the end
    #[arg(long)]
    throws_file: Option<PathBuf>,

    /// Grant this many permanent throws before playing
    #[arg(long, default_value_t = 0)]
    bonus_throws: u32,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    print_settings: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = env_logger::Env::default().default_filter_or(level.to_string());
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Collaborators for a headless session
struct HeadlessHost {
    throws: ThrowState,
    daily: DailyStats,
    /// Wall clock at session start; throw regeneration runs on real time
    clock_origin_ms: u64,
    now_ms: f64,
    reset_at: Option<f64>,
}

impl HeadlessHost {
    fn wall_ms(&self) -> u64 {
        self.clock_origin_ms + self.now_ms as u64
    }
}

impl FrameHooks for HeadlessHost {
    fn play(&mut self, cue: SoundCue) {
        log::debug!("cue {:?}", cue);
    }

    fn outcome(&mut self, event: OutcomeEvent) {
        match &event {
            OutcomeEvent::DailyStats(daily) => self.daily = *daily,
            OutcomeEvent::LeaderboardRank(rank) => log::info!("Leaderboard rank #{}", rank + 1),
            OutcomeEvent::HotStreak { current, best } if *current > 0 => {
                log::info!("Hot streak {} (best {})", current, best)
            }
            _ => log::debug!("event {:?}", event),
        }
    }

    fn schedule_reset(&mut self, delay_ms: u32) {
        self.reset_at = Some(self.now_ms + delay_ms as f64);
    }

    fn daily_stats(&self) -> DailyStats {
        self.daily
    }

    fn consume_throw(&mut self) -> ThrowGrant {
        self.throws.regenerate(self.wall_ms());
        self.throws.consume()
    }
}

/// Read a saved JSON record, falling back to `T::default()`
fn load_json<T: DeserializeOwned + Default>(path: Option<&Path>, what: &str) -> T {
    let Some(path) = path else {
        return T::default();
    };
    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(value) => {
                log::info!("Loaded {} from {}", what, path.display());
                value
            }
            Err(err) => {
                log::warn!("Invalid {} in {}: {}", what, path.display(), err);
                T::default()
            }
        },
        Err(err) => {
            log::info!("Fresh {} ({}: {})", what, path.display(), err);
            T::default()
        }
    }
}

fn log_throws(throws: &ThrowState, now_ms: u64) {
    let Some(left) = throws.total() else {
        log::info!("Throws: unlimited");
        return;
    };
    let next = format_regen_time(throws.ms_until_next(now_ms));
    if next.is_empty() {
        log::info!("Throws left: {}", left);
    } else {
        log::info!("Throws left: {} (next free throw in {})", left, next);
    }
}

/// Run one throw to completion, then wait out the scheduled reset
fn play_throw(
    state: &mut SessionState,
    host: &mut HeadlessHost,
    settings: &Settings,
    args: &Args,
) -> bool {
    let start_ms = host.now_ms;
    let mut launched_ms = None;
    let mut frames = 0;

    while host.reset_at.is_none_or(|at| host.now_ms < at) {
        let elapsed = host.now_ms - start_ms;
        let mut pressed = elapsed < args.hold_ms;

        if state.phase.is_flying() && launched_ms.is_none() {
            launched_ms = Some(host.now_ms);
        }
        if let (Some(launched), Some(float_at)) = (launched_ms, args.float_at_ms) {
            let since = host.now_ms - launched;
            pressed |= since >= float_at && since < float_at + FRAME_MS;
        }

        let input = FrameInput {
            pressed,
            now_ms: host.now_ms,
            thrust: false,
        };
        tick(state, &input, settings, host);
        host.now_ms += FRAME_MS;

        frames += 1;
        if frames > MAX_FRAMES_PER_THROW {
            log::warn!("Throw did not resolve after {} frames", frames);
            return false;
        }
    }

    host.reset_at = None;
    state.reset_throw();
    true
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);
    log::info!("Zeno Flick (headless) starting, seed {}", args.seed);

    let settings = args
        .settings
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();
    if args.print_settings {
        println!("{}", settings.to_json()?);
        return Ok(());
    }

    let progress: Progress = load_json(args.progress.as_deref(), "progress");
    let mut state = SessionState::new(args.seed, progress);
    state.set_angle(args.angle);

    let clock_origin_ms = wall_clock_ms();
    let mut throws = match args.throws_file.as_deref() {
        Some(path) => load_json(Some(path), "throws"),
        None => ThrowState::new(clock_origin_ms),
    };
    if args.bonus_throws > 0 {
        throws.add_permanent(args.bonus_throws);
        log::info!("Granted {} permanent throws", args.bonus_throws);
    }

    let mut host = HeadlessHost {
        throws,
        daily: DailyStats::default(),
        clock_origin_ms,
        now_ms: 0.0,
        reset_at: None,
    };
    log_throws(&host.throws, host.wall_ms());

    for throw in 1..=args.throws {
        log::info!("Throw {} of {}", throw, args.throws);
        let now = host.wall_ms();
        host.throws.regenerate(now);
        if !host.throws.can_make_real_throw() {
            log::warn!("No throws left, playing for practice");
        }
        if !play_throw(&mut state, &mut host, &settings, &args) {
            break;
        }
    }
    log_throws(&host.throws, host.wall_ms());

    let progress = &state.progress;
    log::info!(
        "Session over: best {:.8}, level {}, target {:.8}, score {:.1}, falls {}",
        progress.best,
        progress.zeno_level,
        progress.zeno_target,
        progress.total_score,
        progress.total_falls
    );

    if let Some(path) = &args.progress {
        std::fs::write(path, serde_json::to_string_pretty(progress)?)?;
        log::info!("Saved progress to {}", path.display());
    }
    if let Some(path) = &args.throws_file {
        std::fs::write(path, serde_json::to_string_pretty(&host.throws)?)?;
        log::info!("Saved throws to {}", path.display());
    }
    Ok(())
}
