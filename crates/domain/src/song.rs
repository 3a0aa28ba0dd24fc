use serde::{Deserialize, Serialize};

use crate::{notes::Note, DomainError};

/// Build metadata attached to a rotation. Opaque to playback.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildInfo {
    pub profession: Option<String>,
    pub elite_specialization: Option<String>,
    pub template_code: Option<String>,
}

/// Playable rotation. Built through [`Song::new`] or loaded via
/// [`SongFile`](crate::io::SongFile), never deserialized directly.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Song {
    pub id: String,
    pub name: String,
    pub description: String,
    pub build: BuildInfo,
    pub(crate) notes: Vec<Note>,
}

impl Song {
    /// Notes must already be ordered by `time_in_rotation`; playback walks them
    /// with a cursor and never re-sorts.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        build: BuildInfo,
        notes: Vec<Note>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("song id cannot be empty"));
        }
        if let Some(pair) = notes
            .windows(2)
            .find(|pair| pair[1].time_in_rotation < pair[0].time_in_rotation)
        {
            return Err(DomainError::validation(format!(
                "song {id} notes are not sorted: {} follows {}",
                pair[1].time_in_rotation, pair[0].time_in_rotation
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            description: description.into(),
            build,
            notes,
        })
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Index of the first note at or after `second`, used for practice start offsets.
    pub fn index_at_second(&self, second: u32) -> usize {
        let offset = second as f64;
        self.notes
            .partition_point(|note| note.time_seconds() < offset)
    }

    pub fn length_seconds(&self) -> f64 {
        self.notes
            .last()
            .map(|note| (note.time_in_rotation + note.duration).as_seconds_f64())
            .unwrap_or(0.0)
    }
}
