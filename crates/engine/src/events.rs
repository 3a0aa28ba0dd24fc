use serde::{Deserialize, Serialize};
use tracing::trace;

use hero_domain::{Note, NoteType};

use crate::judgment::HitType;

/// Identifies one spawned note for the lifetime of a session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u64);

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Started,
    Paused,
}

/// Everything the presentation layer needs to draw feedback.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PracticeEvent {
    NoteSpawned {
        id: NoteId,
        note_type: NoteType,
        lane: usize,
        ability_id: Option<u32>,
    },
    NoteHit {
        id: NoteId,
        note_type: NoteType,
        hit: HitType,
    },
    NoteMissed {
        id: NoteId,
        note_type: NoteType,
    },
    PlaybackStateChanged(PlaybackStatus),
    /// No-miss mode froze playback until this note is pressed.
    WaitingForNote {
        id: NoteId,
        note_type: NoteType,
    },
    /// Upcoming notes, already remapped, for the ability queue lane.
    AbilityQueueChanged(Vec<Note>),
}

pub trait FeedbackSink {
    fn publish(&mut self, event: PracticeEvent);
}

/// Discards every event.
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn publish(&mut self, event: PracticeEvent) {
        trace!(?event, "dropping practice event");
    }
}

/// Buffers events until the host drains them, typically once per frame.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<PracticeEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[PracticeEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<PracticeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl FeedbackSink for EventLog {
    fn publish(&mut self, event: PracticeEvent) {
        self.events.push(event);
    }
}

impl<F> FeedbackSink for F
where
    F: FnMut(PracticeEvent),
{
    fn publish(&mut self, event: PracticeEvent) {
        self(event)
    }
}
