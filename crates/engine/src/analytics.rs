use serde::{Deserialize, Serialize};

use crate::events::PracticeEvent;
use crate::judgment::HitType;

/// Running tally of judgments for one practice run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreCard {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub boo: u32,
    pub miss: u32,
    pub combo: u32,
    pub best_combo: u32,
}

impl ScoreCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, hit: HitType) {
        match hit {
            HitType::Perfect => self.perfect += 1,
            HitType::Great => self.great += 1,
            HitType::Good => self.good += 1,
            HitType::Boo => self.boo += 1,
            HitType::Miss => self.miss += 1,
        }
        if hit.is_miss() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.best_combo = self.best_combo.max(self.combo);
        }
    }

    pub fn observe(&mut self, event: &PracticeEvent) {
        match event {
            PracticeEvent::NoteHit { hit, .. } => self.record(*hit),
            PracticeEvent::NoteMissed { .. } => self.record(HitType::Miss),
            _ => {}
        }
    }

    pub fn count(&self, hit: HitType) -> u32 {
        match hit {
            HitType::Perfect => self.perfect,
            HitType::Great => self.great,
            HitType::Good => self.good,
            HitType::Boo => self.boo,
            HitType::Miss => self.miss,
        }
    }

    pub fn judged(&self) -> u32 {
        HitType::ALL.iter().map(|hit| self.count(*hit)).sum()
    }

    /// Weighted accuracy in `[0, 1]`; zero before anything is judged.
    pub fn accuracy(&self) -> f32 {
        let judged = self.judged();
        if judged == 0 {
            return 0.0;
        }
        let points = self.perfect as f32
            + self.great as f32 * 0.75
            + self.good as f32 * 0.5
            + self.boo as f32 * 0.25;
        points / judged as f32
    }
}
