use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hero_domain::{Note, Song, SongData};

use crate::events::{NoteId, PlaybackStatus};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaybackState {
    pub is_started: bool,
    pub is_paused: bool,
    /// Set while no-miss mode holds playback for a note.
    pub waiting_for: Option<NoteId>,
    /// Seconds of rotation time elapsed, including the start offset.
    pub rotation_time: f64,
    /// Next note to spawn.
    pub current_sequence_index: usize,
}

/// Playback clock and spawn cursor for one song.
///
/// The clock is driven by the host's frame deltas scaled by the playback
/// rate at the time of each tick, so a rate change only affects time that
/// passes after it.
#[derive(Debug, Default)]
pub struct Sequencer {
    state: PlaybackState,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        if !self.state.is_started {
            PlaybackStatus::Stopped
        } else if self.state.is_paused || self.state.waiting_for.is_some() {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Started
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started
    }

    /// Started, not paused by the user. No-miss waits still count as running
    /// so that presses are accepted.
    pub fn is_running(&self) -> bool {
        self.state.is_started && !self.state.is_paused
    }

    pub fn waiting_for(&self) -> Option<NoteId> {
        self.state.waiting_for
    }

    pub fn rotation_time(&self) -> f64 {
        self.state.rotation_time
    }

    pub fn current_sequence_index(&self) -> usize {
        self.state.current_sequence_index
    }

    /// Returns `true` when the state changed. A paused sequencer resumes;
    /// a stopped one begins at the song data's start offset.
    pub fn start(&mut self, song: &Song, song_data: &SongData) -> bool {
        if self.state.is_started {
            return self.resume();
        }
        let offset = song_data.start_at_second;
        self.state = PlaybackState {
            is_started: true,
            is_paused: false,
            waiting_for: None,
            rotation_time: offset as f64,
            current_sequence_index: song.index_at_second(offset),
        };
        info!(
            song = %song.id,
            start_at_second = offset,
            index = self.state.current_sequence_index,
            "playback started"
        );
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state.is_paused = true;
        info!(rotation_time = self.state.rotation_time, "playback paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.state.is_started || !self.state.is_paused {
            return false;
        }
        self.state.is_paused = false;
        info!(rotation_time = self.state.rotation_time, "playback resumed");
        true
    }

    /// Always resets the cursor and clock; returns `true` only if playback was
    /// started beforehand.
    pub fn stop(&mut self) -> bool {
        let was_started = self.state.is_started;
        self.state = PlaybackState::default();
        if was_started {
            info!("playback stopped");
        }
        was_started
    }

    pub fn hold_for(&mut self, id: NoteId) {
        debug!(id = id.0, "holding playback for note");
        self.state.waiting_for = Some(id);
    }

    /// Clears a no-miss hold if `id` was the note being waited for.
    pub fn release(&mut self, id: NoteId) -> bool {
        if self.state.waiting_for == Some(id) {
            self.state.waiting_for = None;
            return true;
        }
        false
    }

    /// Advances rotation time by `elapsed_seconds * playback_rate`. No-op unless
    /// running and not held.
    pub fn advance(&mut self, elapsed_seconds: f64, playback_rate: f64) {
        if !self.is_running() || self.state.waiting_for.is_some() {
            return;
        }
        if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
            self.state.rotation_time += elapsed_seconds * playback_rate;
        }
    }

    /// Claims every note whose time has been reached, in song order. Coarse
    /// ticks claim several notes at once rather than skipping any.
    pub fn take_due(&mut self, song: &Song) -> Range<usize> {
        let start = self.state.current_sequence_index.min(song.notes().len());
        if !self.state.is_started {
            return start..start;
        }
        let now = self.state.rotation_time;
        let end = start
            + song.notes()[start..]
                .iter()
                .take_while(|note| note.time_seconds() <= now)
                .count();
        self.state.current_sequence_index = end;
        start..end
    }

    /// Notes not yet spawned, at most `count` of them.
    pub fn upcoming<'a>(&self, song: &'a Song, count: usize) -> &'a [Note] {
        let notes = song.notes();
        let start = self.state.current_sequence_index.min(notes.len());
        let end = (start + count).min(notes.len());
        &notes[start..end]
    }

    pub fn is_exhausted(&self, song: &Song) -> bool {
        self.state.current_sequence_index >= song.notes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hero_domain::{BuildInfo, NoteType};
    use time::Duration;

    fn song(times_ms: &[i64]) -> Song {
        let notes = times_ms
            .iter()
            .map(|&ms| Note::new(NoteType::Weapon2, Duration::milliseconds(ms)))
            .collect();
        Song::new("song", "Song", "", BuildInfo::default(), notes).unwrap()
    }

    #[test]
    fn coarse_tick_spawns_everything_due_in_order() {
        let song = song(&[0, 100, 200, 300, 2000]);
        let mut sequencer = Sequencer::new();
        sequencer.start(&song, &SongData::default());
        assert_eq!(sequencer.take_due(&song), 0..1);
        sequencer.advance(0.5, 1.0);
        assert_eq!(sequencer.take_due(&song), 1..4);
        assert_eq!(sequencer.take_due(&song), 4..4);
        sequencer.advance(2.0, 1.0);
        assert_eq!(sequencer.take_due(&song), 4..5);
        assert!(sequencer.is_exhausted(&song));
    }

    #[test]
    fn playback_rate_scales_rotation_time() {
        let song = song(&[1000]);
        let mut sequencer = Sequencer::new();
        sequencer.start(&song, &SongData::default());
        sequencer.advance(1.5, 0.5);
        assert_eq!(sequencer.rotation_time(), 0.75);
        assert!(sequencer.take_due(&song).is_empty());
        sequencer.advance(0.5, 1.0);
        assert_eq!(sequencer.take_due(&song), 0..1);
    }

    #[test]
    fn start_offset_skips_earlier_notes() {
        let song = song(&[0, 500, 1000, 1500]);
        let data = SongData {
            start_at_second: 1,
            ..SongData::default()
        };
        let mut sequencer = Sequencer::new();
        sequencer.start(&song, &data);
        assert_eq!(sequencer.current_sequence_index(), 2);
        assert_eq!(sequencer.rotation_time(), 1.0);
        assert_eq!(sequencer.take_due(&song), 2..3);
    }

    #[test]
    fn pause_freezes_the_clock() {
        let song = song(&[0]);
        let mut sequencer = Sequencer::new();
        sequencer.start(&song, &SongData::default());
        sequencer.advance(0.25, 1.0);
        assert!(sequencer.pause());
        assert!(!sequencer.pause());
        sequencer.advance(10.0, 1.0);
        assert_eq!(sequencer.rotation_time(), 0.25);
        assert_eq!(sequencer.status(), PlaybackStatus::Paused);
        assert!(sequencer.start(&song, &SongData::default()));
        assert_eq!(sequencer.status(), PlaybackStatus::Started);
        assert_eq!(sequencer.rotation_time(), 0.25);
    }

    #[test]
    fn start_is_a_no_op_while_running() {
        let song = song(&[0, 100]);
        let mut sequencer = Sequencer::new();
        assert!(sequencer.start(&song, &SongData::default()));
        sequencer.advance(0.5, 1.0);
        sequencer.take_due(&song);
        assert!(!sequencer.start(&song, &SongData::default()));
        assert_eq!(sequencer.current_sequence_index(), 2);
    }

    #[test]
    fn stop_is_idempotent() {
        let song = song(&[0, 100]);
        let mut sequencer = Sequencer::new();
        sequencer.start(&song, &SongData::default());
        sequencer.advance(0.5, 1.0);
        sequencer.take_due(&song);
        assert!(sequencer.stop());
        let once = sequencer.state().clone();
        assert!(!sequencer.stop());
        assert_eq!(sequencer.state(), &once);
        assert_eq!(once, PlaybackState::default());
    }

    #[test]
    fn hold_blocks_the_clock_until_released() {
        let song = song(&[0]);
        let mut sequencer = Sequencer::new();
        sequencer.start(&song, &SongData::default());
        sequencer.hold_for(NoteId(7));
        sequencer.advance(1.0, 1.0);
        assert_eq!(sequencer.rotation_time(), 0.0);
        assert_eq!(sequencer.status(), PlaybackStatus::Paused);
        assert!(!sequencer.release(NoteId(8)));
        assert!(sequencer.release(NoteId(7)));
        sequencer.advance(1.0, 1.0);
        assert_eq!(sequencer.rotation_time(), 1.0);
    }

    #[test]
    fn upcoming_is_bounded() {
        let song = song(&[0, 100, 200]);
        let mut sequencer = Sequencer::new();
        sequencer.start(&song, &SongData::default());
        assert_eq!(sequencer.upcoming(&song, 2).len(), 2);
        sequencer.advance(1.0, 1.0);
        sequencer.take_due(&song);
        assert!(sequencer.upcoming(&song, 2).is_empty());
    }
}
