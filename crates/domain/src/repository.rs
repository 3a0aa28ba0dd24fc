use crate::{error::DomainError, song::Song, song_data::SongData};

/// Song provider and practice-settings sink consumed by the playback core.
pub trait SongRepository {
    fn selected_song(&self) -> Option<&Song>;

    /// Practice settings for `song_id`, created with defaults on first reference.
    fn song_data(&mut self, song_id: &str) -> SongData;

    /// Applies `update` to the stored settings and returns the new value.
    fn update_song_data(
        &mut self,
        song_id: &str,
        update: &mut dyn FnMut(&mut SongData),
    ) -> Result<SongData, DomainError>;
}
