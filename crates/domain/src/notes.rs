use serde::{Deserialize, Serialize};
use time::Duration;

/// Number of note lanes on the highway, not counting the ability queue lane.
pub const LANE_COUNT: usize = 6;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NoteType {
    Dodge,
    WeaponSwap,
    Weapon1,
    Weapon2,
    Weapon3,
    Weapon4,
    Weapon5,
    Healing,
    Utility1,
    Utility2,
    Utility3,
    Elite,
    ProfessionSkill1,
    ProfessionSkill2,
    ProfessionSkill3,
    ProfessionSkill4,
    ProfessionSkill5,
    /// Fallback for unrecognised entries in a song file. Rendered, never hittable.
    Unknown,
}

impl NoteType {
    pub const ALL: [NoteType; 18] = [
        NoteType::Dodge,
        NoteType::WeaponSwap,
        NoteType::Weapon1,
        NoteType::Weapon2,
        NoteType::Weapon3,
        NoteType::Weapon4,
        NoteType::Weapon5,
        NoteType::Healing,
        NoteType::Utility1,
        NoteType::Utility2,
        NoteType::Utility3,
        NoteType::Elite,
        NoteType::ProfessionSkill1,
        NoteType::ProfessionSkill2,
        NoteType::ProfessionSkill3,
        NoteType::ProfessionSkill4,
        NoteType::ProfessionSkill5,
        NoteType::Unknown,
    ];

    /// Lane the note travels on. Weapon, slot and profession skills share the
    /// five skill-bar lanes; movement keys and unknown notes use the last one.
    pub fn lane(self) -> usize {
        use NoteType::*;
        match self {
            Weapon1 | Healing | ProfessionSkill1 => 0,
            Weapon2 | Utility1 | ProfessionSkill2 => 1,
            Weapon3 | Utility2 | ProfessionSkill3 => 2,
            Weapon4 | Utility3 | ProfessionSkill4 => 3,
            Weapon5 | Elite | ProfessionSkill5 => 4,
            Dodge | WeaponSwap | Unknown => 5,
        }
    }

    pub fn is_hittable(self) -> bool {
        self != NoteType::Unknown
    }

    pub fn name(self) -> &'static str {
        use NoteType::*;
        match self {
            Dodge => "Dodge",
            WeaponSwap => "WeaponSwap",
            Weapon1 => "Weapon1",
            Weapon2 => "Weapon2",
            Weapon3 => "Weapon3",
            Weapon4 => "Weapon4",
            Weapon5 => "Weapon5",
            Healing => "Healing",
            Utility1 => "Utility1",
            Utility2 => "Utility2",
            Utility3 => "Utility3",
            Elite => "Elite",
            ProfessionSkill1 => "ProfessionSkill1",
            ProfessionSkill2 => "ProfessionSkill2",
            ProfessionSkill3 => "ProfessionSkill3",
            ProfessionSkill4 => "ProfessionSkill4",
            ProfessionSkill5 => "ProfessionSkill5",
            Unknown => "Unknown",
        }
    }

    /// Case-insensitive lookup by name. `None` for anything unrecognised,
    /// including the literal "Unknown".
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .filter(|kind| kind.is_hittable())
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

/// One scheduled keypress in a rotation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub note_type: NoteType,
    /// Offset from the start of the rotation.
    pub time_in_rotation: Duration,
    /// Hold duration, zero for a tap.
    pub duration: Duration,
    pub ability_id: Option<u32>,
    /// Excludes the note from auto-hit.
    pub override_auto: bool,
}

impl Note {
    pub fn new(note_type: NoteType, time_in_rotation: Duration) -> Self {
        Self {
            note_type,
            time_in_rotation,
            duration: Duration::ZERO,
            ability_id: None,
            override_auto: false,
        }
    }

    pub fn with_ability(mut self, ability_id: u32) -> Self {
        self.ability_id = Some(ability_id);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn overriding_auto(mut self) -> Self {
        self.override_auto = true;
        self
    }

    pub fn time_seconds(&self) -> f64 {
        self.time_in_rotation.as_seconds_f64()
    }
}
