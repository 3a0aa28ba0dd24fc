//! Practice session: one song, its practice settings, the highway geometry
//! and the playback state, driven by host ticks, key presses and resizes.

use tracing::{debug, info, warn};

use hero_domain::{DomainError, ModuleSettings, Note, NoteType, Song, SongData, SongRepository};

use crate::analytics::ScoreCard;
use crate::events::{EventLog, FeedbackSink, NoteId, PlaybackStatus, PracticeEvent};
use crate::judgment::HitType;
use crate::layout::WindowInfo;
use crate::sequencer::Sequencer;
use crate::tracker::{ActiveNoteTracker, UpdateRules};

/// Forwards events to the host sink while keeping the score card current.
struct Recorder<'a> {
    card: &'a mut ScoreCard,
    sink: &'a mut dyn FeedbackSink,
}

impl FeedbackSink for Recorder<'_> {
    fn publish(&mut self, event: PracticeEvent) {
        self.card.observe(&event);
        self.sink.publish(event);
    }
}

pub struct PracticeSession<S: FeedbackSink = EventLog> {
    song: Option<Song>,
    song_data: SongData,
    settings: ModuleSettings,
    size: (f32, f32),
    layout: WindowInfo,
    sequencer: Sequencer,
    tracker: ActiveNoteTracker,
    score: ScoreCard,
    sink: S,
}

impl<S: FeedbackSink> PracticeSession<S> {
    pub fn new(settings: ModuleSettings, width: f32, height: f32, sink: S) -> Self {
        let song_data = SongData::default();
        let layout = WindowInfo::calculate(
            width,
            height,
            song_data.effective_note_pace(),
            settings.show_ability_queue,
        );
        Self {
            song: None,
            song_data,
            settings,
            size: (width, height),
            layout,
            sequencer: Sequencer::new(),
            tracker: ActiveNoteTracker::new(),
            score: ScoreCard::new(),
            sink,
        }
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn song_data(&self) -> &SongData {
        &self.song_data
    }

    pub fn settings(&self) -> &ModuleSettings {
        &self.settings
    }

    pub fn layout(&self) -> &WindowInfo {
        &self.layout
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn tracker(&self) -> &ActiveNoteTracker {
        &self.tracker
    }

    pub fn score(&self) -> &ScoreCard {
        &self.score
    }

    pub fn status(&self) -> PlaybackStatus {
        self.sequencer.status()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Every note has spawned and been resolved or expired.
    pub fn is_complete(&self) -> bool {
        match &self.song {
            Some(song) => {
                self.sequencer.is_started()
                    && self.sequencer.is_exhausted(song)
                    && self.tracker.is_empty()
            }
            None => false,
        }
    }

    /// Selected-song change from the song provider. Playback stops.
    pub fn on_selected_song_changed(&mut self, song: Song, song_data: SongData) {
        self.stop();
        info!(song = %song.id, notes = song.notes().len(), "song selected");
        self.song = Some(song);
        self.apply_song_data(song_data);
    }

    /// Loads whatever the repository has selected, or clears the session.
    pub fn load_selected(&mut self, repository: &mut dyn SongRepository) {
        match repository.selected_song().cloned() {
            Some(song) => {
                let data = repository.song_data(&song.id);
                self.on_selected_song_changed(song, data);
            }
            None => {
                self.stop();
                self.song = None;
            }
        }
    }

    pub fn set_module_settings(&mut self, settings: ModuleSettings) {
        let relayout = settings.show_ability_queue != self.settings.show_ability_queue;
        self.settings = settings;
        if relayout {
            self.recalculate_layout();
        }
    }

    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.size = (width, height);
        self.recalculate_layout();
    }

    fn recalculate_layout(&mut self) {
        let (width, height) = self.size;
        self.layout = WindowInfo::calculate(
            width,
            height,
            self.song_data.effective_note_pace(),
            self.settings.show_ability_queue,
        );
        self.tracker.relayout(&self.layout, self.sequencer.waiting_for());
        debug!(
            width = self.layout.width,
            height = self.layout.height,
            speed = self.layout.travel_speed,
            "layout recalculated"
        );
    }

    fn apply_song_data(&mut self, song_data: SongData) {
        if song_data.note_position_change_per_second != song_data.effective_note_pace() {
            warn!(
                pace = song_data.note_position_change_per_second,
                clamped = song_data.effective_note_pace(),
                "note pace out of range"
            );
        }
        self.song_data = song_data;
        self.recalculate_layout();
    }

    /// Persists a practice-setting change through the settings sink and makes
    /// the stored result the active configuration from the next tick on.
    pub fn update_song_data(
        &mut self,
        repository: &mut dyn SongRepository,
        mut update: impl FnMut(&mut SongData),
    ) -> Result<(), DomainError> {
        let Some(song_id) = self.song.as_ref().map(|song| song.id.clone()) else {
            return Err(DomainError::validation("no song selected"));
        };
        let updated = repository.update_song_data(&song_id, &mut update)?;
        self.apply_song_data(updated);
        Ok(())
    }

    pub fn set_playback_rate(
        &mut self,
        repository: &mut dyn SongRepository,
        rate: f32,
    ) -> Result<(), DomainError> {
        self.update_song_data(repository, |data| data.playback_rate = rate)
    }

    pub fn set_start_at_second(
        &mut self,
        repository: &mut dyn SongRepository,
        second: u32,
    ) -> Result<(), DomainError> {
        self.update_song_data(repository, |data| data.start_at_second = second)
    }

    pub fn set_note_pace(
        &mut self,
        repository: &mut dyn SongRepository,
        pace: i32,
    ) -> Result<(), DomainError> {
        self.update_song_data(repository, |data| {
            data.note_position_change_per_second = pace
        })
    }

    pub fn toggle_no_miss_mode(
        &mut self,
        repository: &mut dyn SongRepository,
    ) -> Result<(), DomainError> {
        self.update_song_data(repository, |data| data.no_miss_mode = !data.no_miss_mode)
    }

    pub fn rotate_utility_mapping(
        &mut self,
        repository: &mut dyn SongRepository,
    ) -> Result<(), DomainError> {
        self.update_song_data(repository, SongData::rotate_utility_mapping)
    }

    pub fn start(&mut self) {
        let Some(song) = self.song.as_ref() else {
            debug!("start ignored: no song selected");
            return;
        };
        let fresh = !self.sequencer.is_started();
        if !self.sequencer.start(song, &self.song_data) {
            return;
        }
        if fresh {
            self.score = ScoreCard::new();
            self.tracker.clear();
        }
        self.sink
            .publish(PracticeEvent::PlaybackStateChanged(self.sequencer.status()));
        if fresh {
            self.spawn_due();
            self.publish_queue();
        }
    }

    pub fn pause(&mut self) {
        if self.sequencer.pause() {
            self.sink
                .publish(PracticeEvent::PlaybackStateChanged(PlaybackStatus::Paused));
        }
    }

    pub fn resume(&mut self) {
        if self.sequencer.resume() {
            self.sink
                .publish(PracticeEvent::PlaybackStateChanged(self.sequencer.status()));
        }
    }

    /// Clears every active note and resets the cursor, even when already stopped.
    pub fn stop(&mut self) {
        self.tracker.clear();
        if self.sequencer.stop() {
            self.sink
                .publish(PracticeEvent::PlaybackStateChanged(PlaybackStatus::Stopped));
        }
    }

    pub fn reset(&mut self) {
        self.stop();
    }

    /// Stopped or paused starts; started stops outright rather than pausing.
    /// A no-miss hold reports `Paused`, so toggling it behaves like `start`
    /// and leaves the hold for the held note's key to release.
    pub fn toggle(&mut self) {
        if self.status() == PlaybackStatus::Started {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Host tick. The song data snapshot held by the session is authoritative
    /// for the whole tick.
    pub fn update(&mut self, elapsed_seconds: f32) {
        if !self.sequencer.is_running() || self.sequencer.waiting_for().is_some() {
            return;
        }
        let elapsed = if elapsed_seconds.is_finite() {
            elapsed_seconds.max(0.0)
        } else {
            0.0
        };

        let move_amount = self.layout.travel_speed * elapsed;
        let rules = UpdateRules {
            settings: &self.settings,
            no_miss_mode: self.song_data.no_miss_mode,
        };
        let mut recorder = Recorder {
            card: &mut self.score,
            sink: &mut self.sink,
        };
        if let Some(blocking) = self
            .tracker
            .update(move_amount, &self.layout, rules, &mut recorder)
        {
            self.hold_for(blocking);
            return;
        }

        self.sequencer.advance(
            elapsed as f64,
            self.song_data.effective_playback_rate() as f64,
        );
        if self.spawn_due() > 0 {
            self.publish_queue();
        }
    }

    /// Key press for a note type. Ignored unless playback is running.
    pub fn on_hotkey_pressed(&mut self, note_type: NoteType) -> Option<(NoteId, HitType)> {
        if !self.sequencer.is_running() {
            return None;
        }
        let mut recorder = Recorder {
            card: &mut self.score,
            sink: &mut self.sink,
        };
        let (id, hit) = self.tracker.on_hotkey_pressed(
            note_type,
            &self.layout,
            self.song_data.no_miss_mode,
            &mut recorder,
        )?;
        if self.sequencer.release(id) {
            info!(id = id.0, "no-miss hold released");
            self.sink
                .publish(PracticeEvent::PlaybackStateChanged(self.sequencer.status()));
        }
        Some((id, hit))
    }

    fn hold_for(&mut self, id: NoteId) {
        self.sequencer.hold_for(id);
        let note_type = self
            .tracker
            .get(id)
            .map(|note| note.display_type)
            .unwrap_or(NoteType::Unknown);
        info!(id = id.0, ?note_type, "no-miss mode waiting for note");
        self.sink
            .publish(PracticeEvent::PlaybackStateChanged(PlaybackStatus::Paused));
        self.sink
            .publish(PracticeEvent::WaitingForNote { id, note_type });
    }

    fn spawn_due(&mut self) -> usize {
        let Some(song) = self.song.as_ref() else {
            return 0;
        };
        let due = self.sequencer.take_due(song);
        let count = due.len();
        for note in &song.notes()[due] {
            self.tracker.spawn(note, &self.song_data, &self.layout, &mut self.sink);
        }
        count
    }

    fn publish_queue(&mut self) {
        if !self.settings.show_ability_queue {
            return;
        }
        let Some(song) = self.song.as_ref() else {
            return;
        };
        let queue: Vec<Note> = self
            .sequencer
            .upcoming(song, self.settings.effective_queue_length())
            .iter()
            .map(|note| Note {
                note_type: self.song_data.remap_note_type(note.note_type),
                ..note.clone()
            })
            .collect();
        self.sink.publish(PracticeEvent::AbilityQueueChanged(queue));
    }
}
