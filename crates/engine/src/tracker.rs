use serde::{Deserialize, Serialize};
use tracing::debug;

use hero_domain::{ModuleSettings, Note, NoteType, SongData};

use crate::events::{FeedbackSink, NoteId, PracticeEvent};
use crate::judgment::{classify, HitType};
use crate::layout::WindowInfo;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum HitState {
    NotYetHit,
    Hit(HitType),
    Missed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActiveNote {
    pub id: NoteId,
    /// Authored note, never modified.
    pub source: Note,
    /// Note type after utility remapping; hotkeys match against this.
    pub display_type: NoteType,
    pub lane: usize,
    pub position: f32,
    pub hit_state: HitState,
}

impl ActiveNote {
    pub fn is_pending(&self) -> bool {
        self.hit_state == HitState::NotYetHit && self.display_type.is_hittable()
    }
}

/// Rules that apply to a single tracker update.
#[derive(Clone, Copy, Debug)]
pub struct UpdateRules<'a> {
    pub settings: &'a ModuleSettings,
    pub no_miss_mode: bool,
}

/// Owns every note currently on the highway, oldest first.
#[derive(Debug, Default)]
pub struct ActiveNoteTracker {
    notes: Vec<ActiveNote>,
    next_id: u64,
}

impl ActiveNoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[ActiveNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: NoteId) -> Option<&ActiveNote> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn spawn(
        &mut self,
        note: &Note,
        song_data: &SongData,
        layout: &WindowInfo,
        sink: &mut dyn FeedbackSink,
    ) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        let display_type = song_data.remap_note_type(note.note_type);
        let lane = display_type.lane();
        debug!(id = id.0, ?display_type, lane, "spawning note");
        self.notes.push(ActiveNote {
            id,
            source: note.clone(),
            display_type,
            lane,
            position: layout.spawn_x,
            hit_state: HitState::NotYetHit,
        });
        sink.publish(PracticeEvent::NoteSpawned {
            id,
            note_type: display_type,
            lane,
            ability_id: note.ability_id,
        });
        id
    }

    /// Moves every note left by `move_amount` and resolves auto-hits, misses
    /// and expiry. In no-miss mode pending notes stop on the perfect line
    /// instead of failing; the oldest such note is returned so the caller can
    /// freeze playback until it is pressed.
    pub fn update(
        &mut self,
        move_amount: f32,
        layout: &WindowInfo,
        rules: UpdateRules<'_>,
        sink: &mut dyn FeedbackSink,
    ) -> Option<NoteId> {
        let move_amount = if move_amount.is_finite() {
            move_amount.max(0.0)
        } else {
            0.0
        };
        let late_edge = layout.windows.late_edge();
        let mut blocking = None;

        self.notes.retain_mut(|note| {
            note.position -= move_amount;
            if note.is_pending() {
                let at_perfect = note.position <= layout.perfect_x;
                if at_perfect
                    && rules.settings.auto_hits(note.display_type)
                    && !note.source.override_auto
                {
                    debug!(id = note.id.0, "auto-hit note");
                    return false;
                }
                if rules.no_miss_mode && at_perfect {
                    note.position = layout.perfect_x;
                    if blocking.is_none() {
                        blocking = Some(note.id);
                    }
                    return true;
                }
                if note.position < late_edge {
                    debug!(id = note.id.0, note_type = ?note.display_type, "note missed");
                    note.hit_state = HitState::Missed;
                    sink.publish(PracticeEvent::NoteMissed {
                        id: note.id,
                        note_type: note.display_type,
                    });
                }
            }
            note.position >= layout.destroy_x
        });
        blocking
    }

    /// Resolves the oldest pending note of `note_type`. At most one note is
    /// judged per press; presses with nothing to match are ignored. In
    /// no-miss mode a press outside every window is ignored instead of
    /// failing the note.
    pub fn on_hotkey_pressed(
        &mut self,
        note_type: NoteType,
        layout: &WindowInfo,
        no_miss_mode: bool,
        sink: &mut dyn FeedbackSink,
    ) -> Option<(NoteId, HitType)> {
        let index = self
            .notes
            .iter()
            .position(|note| note.is_pending() && note.display_type == note_type)?;
        let hit = classify(self.notes[index].position, &layout.windows);
        let note = &mut self.notes[index];
        let id = note.id;
        if hit.is_miss() {
            if no_miss_mode {
                return None;
            }
            debug!(id = id.0, ?note_type, "press outside every window");
            note.hit_state = HitState::Missed;
            sink.publish(PracticeEvent::NoteMissed { id, note_type });
        } else {
            debug!(id = id.0, ?note_type, ?hit, "note hit");
            self.notes.remove(index);
            sink.publish(PracticeEvent::NoteHit { id, note_type, hit });
        }
        Some((id, hit))
    }

    /// Keeps positions inside the new travel range after a resize. The note a
    /// no-miss hold is waiting for stays pinned to the new perfect line.
    pub fn relayout(&mut self, layout: &WindowInfo, held: Option<NoteId>) {
        for note in &mut self.notes {
            note.position = if Some(note.id) == held {
                layout.perfect_x
            } else {
                layout.clamp_position(note.position)
            };
        }
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use time::Duration;

    fn layout() -> WindowInfo {
        WindowInfo::calculate(1000.0, 600.0, 300, false)
    }

    fn rules(settings: &ModuleSettings) -> UpdateRules<'_> {
        UpdateRules {
            settings,
            no_miss_mode: false,
        }
    }

    fn note(kind: NoteType) -> Note {
        Note::new(kind, Duration::ZERO)
    }

    fn distance_to_perfect(layout: &WindowInfo) -> f32 {
        layout.spawn_x - layout.perfect_x
    }

    #[test]
    fn spawn_places_note_on_remapped_lane() {
        let layout = layout();
        let mut data = SongData::default();
        data.rotate_utility_mapping();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let id = tracker.spawn(&note(NoteType::Utility2), &data, &layout, &mut log);
        let active = tracker.get(id).unwrap();
        assert_eq!(active.display_type, NoteType::Utility3);
        assert_eq!(active.source.note_type, NoteType::Utility2);
        assert_eq!(active.lane, NoteType::Utility3.lane());
        assert_eq!(active.position, layout.spawn_x);
        assert!(matches!(
            log.events()[0],
            PracticeEvent::NoteSpawned { note_type: NoteType::Utility3, .. }
        ));
    }

    #[test]
    fn first_spawned_note_wins_the_press() {
        let layout = layout();
        let settings = ModuleSettings::default();
        let data = SongData::default();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let first = tracker.spawn(&note(NoteType::Weapon1), &data, &layout, &mut log);
        tracker.update(50.0, &layout, rules(&settings), &mut log);
        let second = tracker.spawn(&note(NoteType::Weapon1), &data, &layout, &mut log);
        tracker.update(distance_to_perfect(&layout) - 50.0, &layout, rules(&settings), &mut log);

        let resolved = tracker.on_hotkey_pressed(NoteType::Weapon1, &layout, false, &mut log);
        assert_eq!(resolved, Some((first, HitType::Perfect)));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.notes()[0].id, second);
        assert!(tracker.notes()[0].is_pending());
    }

    #[test]
    fn press_without_matching_note_is_ignored() {
        let layout = layout();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        tracker.spawn(&note(NoteType::Weapon2), &SongData::default(), &layout, &mut log);
        log.clear();
        assert_eq!(
            tracker.on_hotkey_pressed(NoteType::Elite, &layout, false, &mut log),
            None
        );
        assert!(log.events().is_empty());
    }

    #[test]
    fn early_press_is_a_miss_that_lingers() {
        let layout = layout();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let id = tracker.spawn(&note(NoteType::Weapon3), &SongData::default(), &layout, &mut log);
        let result = tracker.on_hotkey_pressed(NoteType::Weapon3, &layout, false, &mut log);
        assert_eq!(result, Some((id, HitType::Miss)));
        assert_eq!(tracker.get(id).unwrap().hit_state, HitState::Missed);
        assert_eq!(
            tracker.on_hotkey_pressed(NoteType::Weapon3, &layout, false, &mut log),
            None
        );
    }

    #[test]
    fn unhit_note_misses_once_then_expires() {
        let layout = layout();
        let settings = ModuleSettings::default();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let id = tracker.spawn(&note(NoteType::Weapon4), &SongData::default(), &layout, &mut log);
        log.clear();

        let past_late_edge = layout.spawn_x - layout.windows.late_edge() + 1.0;
        tracker.update(past_late_edge, &layout, rules(&settings), &mut log);
        assert_eq!(
            log.events(),
            &[PracticeEvent::NoteMissed { id, note_type: NoteType::Weapon4 }]
        );
        assert_eq!(tracker.get(id).unwrap().hit_state, HitState::Missed);

        tracker.update(1.0, &layout, rules(&settings), &mut log);
        assert_eq!(log.events().len(), 1);
        assert_eq!(tracker.len(), 1);

        tracker.update(layout.width, &layout, rules(&settings), &mut log);
        assert!(tracker.is_empty());
        assert_eq!(log.events().len(), 1);
    }

    #[test]
    fn auto_hit_removes_weapon1_silently() {
        let layout = layout();
        let settings = ModuleSettings {
            auto_hit_weapon1: true,
            ..ModuleSettings::default()
        };
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        tracker.spawn(&note(NoteType::Weapon1), &SongData::default(), &layout, &mut log);
        log.clear();
        tracker.update(distance_to_perfect(&layout), &layout, rules(&settings), &mut log);
        assert!(tracker.is_empty());
        assert!(log.events().is_empty());
    }

    #[test]
    fn override_auto_notes_still_need_a_press() {
        let layout = layout();
        let settings = ModuleSettings {
            auto_hit_weapon1: true,
            ..ModuleSettings::default()
        };
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let overridden = note(NoteType::Weapon1).overriding_auto();
        tracker.spawn(&overridden, &SongData::default(), &layout, &mut log);
        tracker.update(distance_to_perfect(&layout), &layout, rules(&settings), &mut log);
        assert_eq!(tracker.len(), 1);
        let (_, hit) = tracker
            .on_hotkey_pressed(NoteType::Weapon1, &layout, false, &mut log)
            .unwrap();
        assert_eq!(hit, HitType::Perfect);
    }

    #[test]
    fn no_miss_mode_holds_note_on_perfect_line() {
        let layout = layout();
        let settings = ModuleSettings::default();
        let no_miss = UpdateRules {
            settings: &settings,
            no_miss_mode: true,
        };
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let id = tracker.spawn(&note(NoteType::Elite), &SongData::default(), &layout, &mut log);
        log.clear();

        let blocking = tracker.update(layout.width * 2.0, &layout, no_miss, &mut log);
        assert_eq!(blocking, Some(id));
        assert_eq!(tracker.get(id).unwrap().position, layout.perfect_x);
        assert!(log.events().is_empty());

        let result = tracker.on_hotkey_pressed(NoteType::Elite, &layout, true, &mut log);
        assert_eq!(result, Some((id, HitType::Perfect)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn no_miss_mode_ignores_early_presses() {
        let layout = layout();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let id = tracker.spawn(&note(NoteType::Healing), &SongData::default(), &layout, &mut log);
        assert_eq!(
            tracker.on_hotkey_pressed(NoteType::Healing, &layout, true, &mut log),
            None
        );
        assert!(tracker.get(id).unwrap().is_pending());
    }

    #[test]
    fn unknown_notes_never_judge() {
        let layout = layout();
        let settings = ModuleSettings::default();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        tracker.spawn(&note(NoteType::Unknown), &SongData::default(), &layout, &mut log);
        log.clear();
        assert_eq!(
            tracker.on_hotkey_pressed(NoteType::Unknown, &layout, false, &mut log),
            None
        );
        let no_miss = UpdateRules {
            settings: &settings,
            no_miss_mode: true,
        };
        assert_eq!(tracker.update(layout.width * 0.9, &layout, no_miss, &mut log), None);
        tracker.update(layout.width, &layout, rules(&settings), &mut log);
        assert!(tracker.is_empty());
        assert!(log.events().is_empty());
    }

    #[test]
    fn relayout_clamps_positions() {
        let wide = WindowInfo::calculate(2000.0, 600.0, 300, false);
        let narrow = layout();
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        tracker.spawn(&note(NoteType::Weapon5), &SongData::default(), &wide, &mut log);
        tracker.relayout(&narrow, None);
        assert_eq!(tracker.notes()[0].position, narrow.spawn_x);
    }

    #[test]
    fn relayout_repins_held_note() {
        let narrow = layout();
        let wide = WindowInfo::calculate(2000.0, 600.0, 300, false);
        let settings = ModuleSettings::default();
        let no_miss = UpdateRules {
            settings: &settings,
            no_miss_mode: true,
        };
        let mut tracker = ActiveNoteTracker::new();
        let mut log = EventLog::new();
        let id = tracker.spawn(&note(NoteType::Elite), &SongData::default(), &narrow, &mut log);
        let held = tracker.update(narrow.width, &narrow, no_miss, &mut log);
        assert_eq!(held, Some(id));

        tracker.relayout(&wide, held);
        assert_eq!(tracker.get(id).unwrap().position, wide.perfect_x);
        let result = tracker.on_hotkey_pressed(NoteType::Elite, &wide, true, &mut log);
        assert_eq!(result, Some((id, HitType::Perfect)));
    }
}
