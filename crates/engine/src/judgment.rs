use serde::{Deserialize, Serialize};

use crate::layout::TimingWindows;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HitType {
    Perfect,
    Great,
    Good,
    Boo,
    Miss,
}

impl HitType {
    pub const ALL: [HitType; 5] = [
        HitType::Perfect,
        HitType::Great,
        HitType::Good,
        HitType::Boo,
        HitType::Miss,
    ];

    pub fn is_miss(self) -> bool {
        self == HitType::Miss
    }

    pub fn label(self) -> &'static str {
        match self {
            HitType::Perfect => "Perfect",
            HitType::Great => "Great",
            HitType::Good => "Good",
            HitType::Boo => "Boo",
            HitType::Miss => "Miss",
        }
    }
}

/// Tightest window containing `position` wins; window edges are inclusive, so
/// a position exactly on an edge belongs to the inner window.
pub fn classify(position: f32, windows: &TimingWindows) -> HitType {
    if windows.perfect.contains(position) {
        HitType::Perfect
    } else if windows.great.contains(position) {
        HitType::Great
    } else if windows.good.contains(position) {
        HitType::Good
    } else if windows.boo.contains(position) {
        HitType::Boo
    } else {
        HitType::Miss
    }
}
