pub mod error;
pub mod io;
pub mod notes;
pub mod repository;
pub mod settings;
pub mod song;
pub mod song_data;

pub use crate::error::DomainError;
pub use crate::io::{export_song_json, load_song_reader, load_song_str, LoadedSong, SongFile};
pub use crate::notes::{Note, NoteType, LANE_COUNT};
pub use crate::repository::SongRepository;
pub use crate::settings::ModuleSettings;
pub use crate::song::{BuildInfo, Song};
pub use crate::song_data::{SongData, UtilityKey};
