use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use hero_domain::{load_song_reader, DomainError, Song, SongData, SongRepository};

use crate::config::APP_DIR;

const SONGS_DIR: &str = "songs";
const SONG_DATA_FILE: &str = "song_data.json";

type SelectionListener = Box<dyn FnMut(&Song, &SongData)>;

/// Songs available for practice plus their per-song practice settings.
///
/// With a storage directory, song files are read from `songs/*.json` and
/// practice settings are written to `song_data.json` after every change.
#[derive(Default)]
pub struct SongLibrary {
    songs: BTreeMap<String, Song>,
    song_data: HashMap<String, SongData>,
    selected: Option<String>,
    storage: Option<PathBuf>,
    listeners: Vec<SelectionListener>,
}

impl SongLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_dir() -> Option<PathBuf> {
        Some(dirs::data_dir()?.join(APP_DIR))
    }

    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(dir.join(SONGS_DIR))
            .with_context(|| format!("create song library {:?}", dir))?;
        let mut library = Self {
            song_data: load_song_data(&dir.join(SONG_DATA_FILE))?,
            storage: Some(dir.clone()),
            ..Self::default()
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.join(SONGS_DIR))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();
        paths.sort();
        for path in paths {
            if let Err(err) = library.import_song_file(&path) {
                warn!(path = %path.display(), error = %err, "skipping unreadable song");
            }
        }
        info!(
            dir = %dir.display(),
            songs = library.songs.len(),
            "song library opened"
        );
        Ok(library)
    }

    /// Reads a song file, logging any recoverable problems, and adds it.
    pub fn import_song_file(&mut self, path: &Path) -> Result<String> {
        let file = File::open(path).with_context(|| format!("open song file {:?}", path))?;
        let loaded = load_song_reader(BufReader::new(file))
            .with_context(|| format!("load song file {:?}", path))?;
        for warning in &loaded.warnings {
            warn!(song = %loaded.song.id, "{warning}");
        }
        let id = loaded.song.id.clone();
        self.add_song(loaded.song);
        Ok(id)
    }

    /// Adds or replaces a song by id.
    pub fn add_song(&mut self, song: Song) {
        debug!(song = %song.id, notes = song.notes().len(), "adding song");
        self.songs.insert(song.id.clone(), song);
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.get(id)
    }

    pub fn songs(&self) -> impl Iterator<Item = &Song> {
        self.songs.values()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn on_selected_song_changed(&mut self, listener: impl FnMut(&Song, &SongData) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Selects a song and notifies listeners with its current practice settings.
    pub fn select(&mut self, id: &str) -> Result<()> {
        let song = self
            .songs
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("unknown song {id}"))?;
        let data = self.song_data.entry(id.to_string()).or_default().clone();
        info!(song = %id, "song selected");
        for listener in &mut self.listeners {
            listener(song, &data);
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let Some(dir) = &self.storage else {
            return Ok(());
        };
        let path = dir.join(SONG_DATA_FILE);
        let json = serde_json::to_string_pretty(&self.song_data)?;
        std::fs::write(&path, json).with_context(|| format!("write song data {:?}", path))?;
        debug!(path = %path.display(), entries = self.song_data.len(), "song data saved");
        Ok(())
    }
}

fn load_song_data(path: &Path) -> Result<HashMap<String, SongData>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data =
        std::fs::read_to_string(path).with_context(|| format!("read song data {:?}", path))?;
    let parsed =
        serde_json::from_str(&data).with_context(|| format!("parse song data {:?}", path))?;
    Ok(parsed)
}

impl SongRepository for SongLibrary {
    fn selected_song(&self) -> Option<&Song> {
        self.selected.as_deref().and_then(|id| self.songs.get(id))
    }

    fn song_data(&mut self, song_id: &str) -> SongData {
        self.song_data
            .entry(song_id.to_string())
            .or_default()
            .clone()
    }

    fn update_song_data(
        &mut self,
        song_id: &str,
        update: &mut dyn FnMut(&mut SongData),
    ) -> Result<SongData, DomainError> {
        let mut updated = self.song_data.get(song_id).cloned().unwrap_or_default();
        update(&mut updated);
        let previous = self
            .song_data
            .insert(song_id.to_string(), updated.clone());
        if let Err(err) = self.save() {
            match previous {
                Some(previous) => self.song_data.insert(song_id.to_string(), previous),
                None => self.song_data.remove(song_id),
            };
            return Err(DomainError::storage(format!("{err:#}")));
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hero_domain::{BuildInfo, Note, NoteType};
    use std::cell::RefCell;
    use std::rc::Rc;
    use time::Duration;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{APP_DIR}-{name}-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    fn song(id: &str) -> Song {
        Song::new(
            id,
            "Song",
            "",
            BuildInfo::default(),
            vec![Note::new(NoteType::Weapon1, Duration::ZERO)],
        )
        .unwrap()
    }

    #[test]
    fn song_data_defaults_on_first_reference() {
        let mut library = SongLibrary::new();
        assert_eq!(library.song_data("anything"), SongData::default());
    }

    #[test]
    fn select_notifies_listeners() {
        let mut library = SongLibrary::new();
        library.add_song(song("a"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        library.on_selected_song_changed(move |song, data| {
            sink.borrow_mut().push((song.id.clone(), data.playback_rate));
        });
        library.select("a").unwrap();
        assert!(library.select("missing").is_err());
        assert_eq!(seen.borrow().as_slice(), &[("a".to_string(), 1.0)]);
        assert_eq!(library.selected_song().map(|s| s.id.as_str()), Some("a"));
    }

    #[test]
    fn song_data_persists_across_opens() {
        let dir = scratch_dir("library-persist");
        {
            let mut library = SongLibrary::open(&dir).unwrap();
            library
                .update_song_data("a", &mut |data: &mut SongData| data.playback_rate = 0.5)
                .unwrap();
        }
        let mut reopened = SongLibrary::open(&dir).unwrap();
        assert_eq!(reopened.song_data("a").playback_rate, 0.5);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn failed_save_keeps_previous_song_data() {
        let dir = scratch_dir("library-save-failure");
        let mut library = SongLibrary::open(&dir).unwrap();
        library
            .update_song_data("a", &mut |data: &mut SongData| data.playback_rate = 0.5)
            .unwrap();
        std::fs::remove_file(dir.join(SONG_DATA_FILE)).unwrap();
        std::fs::create_dir(dir.join(SONG_DATA_FILE)).unwrap();

        let result =
            library.update_song_data("a", &mut |data: &mut SongData| data.no_miss_mode = true);
        assert!(matches!(result, Err(DomainError::Storage(_))));
        let stored = library.song_data("a");
        assert!(!stored.no_miss_mode);
        assert_eq!(stored.playback_rate, 0.5);

        assert!(library
            .update_song_data("b", &mut |data: &mut SongData| data.no_miss_mode = true)
            .is_err());
        assert!(!library.song_data.contains_key("b"));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn open_imports_song_files_and_skips_broken_ones() {
        let dir = scratch_dir("library-import");
        std::fs::create_dir_all(dir.join(SONGS_DIR)).unwrap();
        std::fs::write(
            dir.join(SONGS_DIR).join("good.json"),
            r#"{"id": "good", "notes": [{"type": "Elite", "time_ms": 0}, {"type": "Bogus", "time_ms": 10}]}"#,
        )
        .unwrap();
        std::fs::write(dir.join(SONGS_DIR).join("bad.json"), "not json").unwrap();
        std::fs::write(dir.join(SONGS_DIR).join("readme.txt"), "ignored").unwrap();

        let library = SongLibrary::open(&dir).unwrap();
        assert_eq!(library.songs().count(), 1);
        let good = library.song("good").unwrap();
        assert_eq!(good.notes()[1].note_type, NoteType::Unknown);
        std::fs::remove_dir_all(dir).ok();
    }
}
