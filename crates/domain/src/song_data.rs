use serde::{Deserialize, Serialize};

use crate::notes::NoteType;

pub const MIN_NOTE_PACE: i32 = 75;
pub const MAX_NOTE_PACE: i32 = 600;
pub const DEFAULT_NOTE_PACE: i32 = 300;
pub const DEFAULT_PLAYBACK_RATE: f32 = 1.0;

/// Physical utility key a utility slot is bound to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UtilityKey {
    One,
    Two,
    Three,
}

impl UtilityKey {
    pub fn note_type(self) -> NoteType {
        match self {
            UtilityKey::One => NoteType::Utility1,
            UtilityKey::Two => NoteType::Utility2,
            UtilityKey::Three => NoteType::Utility3,
        }
    }
}

/// Traversal order for `rotate_utility_mapping`. Each step is a single swap,
/// so consecutive assignments differ in two slots.
const UTILITY_PERMUTATIONS: [[UtilityKey; 3]; 6] = {
    use UtilityKey::*;
    [
        [One, Two, Three],
        [One, Three, Two],
        [Three, One, Two],
        [Three, Two, One],
        [Two, Three, One],
        [Two, One, Three],
    ]
};

/// Per-song practice configuration keyed by song id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SongData {
    pub utility1_mapping: UtilityKey,
    pub utility2_mapping: UtilityKey,
    pub utility3_mapping: UtilityKey,
    pub no_miss_mode: bool,
    pub playback_rate: f32,
    pub start_at_second: u32,
    pub note_position_change_per_second: i32,
}

impl Default for SongData {
    fn default() -> Self {
        Self {
            utility1_mapping: UtilityKey::One,
            utility2_mapping: UtilityKey::Two,
            utility3_mapping: UtilityKey::Three,
            no_miss_mode: false,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            start_at_second: 0,
            note_position_change_per_second: DEFAULT_NOTE_PACE,
        }
    }
}

impl SongData {
    pub fn utility_mapping(&self) -> [UtilityKey; 3] {
        [
            self.utility1_mapping,
            self.utility2_mapping,
            self.utility3_mapping,
        ]
    }

    fn set_utility_mapping(&mut self, mapping: [UtilityKey; 3]) {
        self.utility1_mapping = mapping[0];
        self.utility2_mapping = mapping[1];
        self.utility3_mapping = mapping[2];
    }

    /// A stored mapping is only honoured when it is a permutation.
    pub fn has_valid_utility_mapping(&self) -> bool {
        UTILITY_PERMUTATIONS.contains(&self.utility_mapping())
    }

    /// Advances to the next of the six utility assignments. An invalid stored
    /// mapping restarts the cycle from the identity assignment.
    pub fn rotate_utility_mapping(&mut self) {
        let current = self.utility_mapping();
        let next = match UTILITY_PERMUTATIONS.iter().position(|p| *p == current) {
            Some(index) => UTILITY_PERMUTATIONS[(index + 1) % UTILITY_PERMUTATIONS.len()],
            None => UTILITY_PERMUTATIONS[0],
        };
        self.set_utility_mapping(next);
    }

    /// Display note type for an authored note type. Only utility slots move.
    pub fn remap_note_type(&self, note_type: NoteType) -> NoteType {
        if !self.has_valid_utility_mapping() {
            return note_type;
        }
        match note_type {
            NoteType::Utility1 => self.utility1_mapping.note_type(),
            NoteType::Utility2 => self.utility2_mapping.note_type(),
            NoteType::Utility3 => self.utility3_mapping.note_type(),
            other => other,
        }
    }

    pub fn effective_note_pace(&self) -> i32 {
        self.note_position_change_per_second
            .clamp(MIN_NOTE_PACE, MAX_NOTE_PACE)
    }

    pub fn effective_playback_rate(&self) -> f32 {
        if self.playback_rate.is_finite() && self.playback_rate > 0.0 {
            self.playback_rate
        } else {
            DEFAULT_PLAYBACK_RATE
        }
    }
}
