use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hero_domain::{load_song_reader, NoteType};
use hero_engine::{HitType, NullSink, PlaybackStatus, PracticeSession};
use hero_services::{load_settings, SongLibrary};

/// Seconds simulated past the last note before giving up.
const TAIL_SECONDS: f64 = 10.0;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Simulate a practice run of a rotation with a virtual player"
)]
struct Args {
    /// Path to a song JSON file
    song: PathBuf,
    /// Playback rate, 1.0 is normal speed
    #[arg(long)]
    rate: Option<f32>,
    /// Note pace (clamped to 75..=600)
    #[arg(long)]
    pace: Option<i32>,
    /// Second of the rotation to start at
    #[arg(long)]
    start_at: Option<u32>,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 720.0)]
    height: f32,
    /// Frame interval in milliseconds
    #[arg(long, default_value_t = 16.0)]
    tick_ms: f32,
    /// How late (positive) or early (negative) the player presses, in milliseconds
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset_ms: f32,
    /// Auto-hit Weapon1 notes
    #[arg(long)]
    auto_hit: bool,
    /// Hold playback on notes instead of missing them
    #[arg(long)]
    no_miss: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let file = File::open(&args.song).with_context(|| format!("open song {:?}", args.song))?;
    let loaded = load_song_reader(BufReader::new(file))?;
    for warning in &loaded.warnings {
        warn!(song = %loaded.song.id, "{warning}");
    }
    let song_id = loaded.song.id.clone();
    let song_length = loaded.song.length_seconds();

    let mut settings = load_settings().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unreadable module settings");
        Default::default()
    });
    settings.auto_hit_weapon1 |= args.auto_hit;

    let mut library = SongLibrary::new();
    library.add_song(loaded.song);
    library.select(&song_id)?;

    let mut session = PracticeSession::new(settings, args.width, args.height, NullSink);
    session.load_selected(&mut library);
    if let Some(rate) = args.rate {
        session.set_playback_rate(&mut library, rate)?;
    }
    if let Some(pace) = args.pace {
        session.set_note_pace(&mut library, pace)?;
    }
    if let Some(second) = args.start_at {
        session.set_start_at_second(&mut library, second)?;
    }
    if args.no_miss != session.song_data().no_miss_mode {
        session.toggle_no_miss_mode(&mut library)?;
    }

    let tick = (args.tick_ms / 1000.0).max(0.001);
    let rate = session.song_data().effective_playback_rate() as f64;
    let budget = (song_length / rate + session.layout().seconds_to_perfect() as f64 + TAIL_SECONDS)
        .max(TAIL_SECONDS);
    info!(song = %song_id, tick, budget, "simulating practice run");

    session.start();
    let mut simulated = 0.0f64;
    while !session.is_complete() && simulated < budget {
        session.update(tick);
        simulated += tick as f64;
        for note_type in presses_due(&session, args.offset_ms) {
            session.on_hotkey_pressed(note_type);
        }
        if session.status() == PlaybackStatus::Stopped {
            break;
        }
    }
    if !session.is_complete() {
        warn!(simulated, "run did not complete within the time budget");
    }

    let score = session.score();
    println!("Song: {song_id}");
    for hit in HitType::ALL {
        println!("{:>8}: {}", hit.label(), score.count(hit));
    }
    println!("Best combo: {}", score.best_combo);
    println!("Accuracy: {:.1}%", score.accuracy() * 100.0);
    Ok(())
}

/// Note types the virtual player presses this frame: every pending note that
/// has travelled `offset_ms` past the perfect line, or the note a no-miss
/// hold is waiting for.
fn presses_due(session: &PracticeSession<NullSink>, offset_ms: f32) -> Vec<NoteType> {
    let layout = session.layout();
    let trigger = layout.perfect_x - offset_ms / 1000.0 * layout.travel_speed;
    let waiting = session.sequencer().waiting_for();
    session
        .tracker()
        .notes()
        .iter()
        .filter(|note| note.is_pending())
        .filter(|note| note.position <= trigger || Some(note.id) == waiting)
        .map(|note| note.display_type)
        .collect()
}
