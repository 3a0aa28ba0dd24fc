use serde::{Deserialize, Serialize};

use crate::notes::NoteType;

pub const DEFAULT_ABILITY_QUEUE_LENGTH: usize = 5;
pub const MAX_ABILITY_QUEUE_LENGTH: usize = 16;

/// Module-wide practice settings, shared by every song.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModuleSettings {
    pub auto_hit_weapon1: bool,
    pub show_ability_queue: bool,
    pub ability_queue_length: usize,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            auto_hit_weapon1: false,
            show_ability_queue: false,
            ability_queue_length: DEFAULT_ABILITY_QUEUE_LENGTH,
        }
    }
}

impl ModuleSettings {
    pub fn auto_hits(&self, note_type: NoteType) -> bool {
        self.auto_hit_weapon1 && note_type == NoteType::Weapon1
    }

    pub fn effective_queue_length(&self) -> usize {
        self.ability_queue_length.clamp(1, MAX_ABILITY_QUEUE_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_hit_only_applies_to_weapon1() {
        let settings = ModuleSettings {
            auto_hit_weapon1: true,
            ..ModuleSettings::default()
        };
        assert!(settings.auto_hits(NoteType::Weapon1));
        assert!(!settings.auto_hits(NoteType::Weapon2));
        assert!(!ModuleSettings::default().auto_hits(NoteType::Weapon1));
    }

    #[test]
    fn older_settings_files_fill_in_defaults() {
        let settings: ModuleSettings =
            serde_json::from_str(r#"{"auto_hit_weapon1": true, "ability_queue_length": 0}"#)
                .unwrap();
        assert!(settings.auto_hit_weapon1);
        assert!(!settings.show_ability_queue);
        assert_eq!(settings.effective_queue_length(), 1);
    }
}
