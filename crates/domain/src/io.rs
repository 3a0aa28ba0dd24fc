use std::io::Read;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    error::DomainError,
    notes::{Note, NoteType},
    song::{BuildInfo, Song},
};

/// On-disk representation of a single note.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NoteRecord {
    #[serde(rename = "type")]
    pub note_type: String,
    pub time_ms: i64,
    #[serde(default)]
    pub duration_ms: i64,
    #[serde(default)]
    pub ability_id: Option<u32>,
    #[serde(default)]
    pub override_auto: bool,
}

/// On-disk representation of a rotation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SongFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub build: BuildInfo,
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
}

/// A song plus the recoverable problems found while loading it.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedSong {
    pub song: Song,
    pub warnings: Vec<String>,
}

impl SongFile {
    pub fn from_song(song: &Song) -> Self {
        Self {
            id: song.id.clone(),
            name: song.name.clone(),
            description: song.description.clone(),
            build: song.build.clone(),
            notes: song
                .notes()
                .iter()
                .map(|note| NoteRecord {
                    note_type: note.note_type.name().to_string(),
                    time_ms: note.time_in_rotation.whole_milliseconds() as i64,
                    duration_ms: note.duration.whole_milliseconds() as i64,
                    ability_id: note.ability_id,
                    override_auto: note.override_auto,
                })
                .collect(),
        }
    }

    /// Converts to a playable song. Unknown note types become dead
    /// `NoteType::Unknown` notes and out-of-order notes are stably sorted;
    /// both are reported as warnings rather than failures.
    pub fn into_song(self) -> Result<LoadedSong, DomainError> {
        let mut warnings = Vec::new();
        let mut notes = Vec::with_capacity(self.notes.len());
        for (index, record) in self.notes.into_iter().enumerate() {
            let note_type = match NoteType::parse(&record.note_type) {
                Some(kind) => kind,
                None => {
                    warnings.push(format!(
                        "note {index}: unknown note type {:?}",
                        record.note_type
                    ));
                    NoteType::Unknown
                }
            };
            if record.time_ms < 0 {
                warnings.push(format!(
                    "note {index}: negative time {}ms clamped to 0",
                    record.time_ms
                ));
            }
            notes.push(Note {
                note_type,
                time_in_rotation: Duration::milliseconds(record.time_ms.max(0)),
                duration: Duration::milliseconds(record.duration_ms.max(0)),
                ability_id: record.ability_id,
                override_auto: record.override_auto,
            });
        }
        if notes
            .windows(2)
            .any(|pair| pair[1].time_in_rotation < pair[0].time_in_rotation)
        {
            warnings.push("notes were not in time order and have been sorted".to_string());
            notes.sort_by_key(|note| note.time_in_rotation);
        }
        let song = Song::new(self.id, self.name, self.description, self.build, notes)?;
        Ok(LoadedSong { song, warnings })
    }
}

pub fn load_song_str(text: &str) -> Result<LoadedSong, DomainError> {
    let file: SongFile = serde_json::from_str(text)?;
    file.into_song()
}

pub fn load_song_reader<R: Read>(reader: R) -> Result<LoadedSong, DomainError> {
    let file: SongFile = serde_json::from_reader(reader)?;
    file.into_song()
}

pub fn export_song_json(song: &Song) -> Result<Vec<u8>, DomainError> {
    serde_json::to_vec_pretty(&SongFile::from_song(song))
        .map_err(|err| DomainError::Serialization(err.to_string()))
}
