use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Rules;

pub(crate) const SAVE_VERSION: u32 = 1;

pub(crate) const DEFAULT_NAME: &str = "Lofty";

/// The whole persisted pet. Mutated only by the decay engine, the action
/// processor, and the progression system; everything else gets clones.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Pet {
    pub(crate) name: String,
    pub(crate) hunger: f32,
    pub(crate) happiness: f32,
    pub(crate) energy: f32,
    pub(crate) health: f32,
    pub(crate) weight: f32,
    pub(crate) xp: u64,
    pub(crate) level: u32,
    pub(crate) age_ticks: u64,
    pub(crate) poop_count: u32,
    pub(crate) total_commits: u64,
    pub(crate) total_files: u64,
    pub(crate) total_commands: u64,
    pub(crate) achievements: Vec<String>,
    pub(crate) alive: bool,
    pub(crate) birth: DateTime<Utc>,
}

impl Default for Pet {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            hunger: 100.0,
            happiness: 100.0,
            energy: 100.0,
            health: 100.0,
            weight: 20.0,
            xp: 0,
            level: 1,
            age_ticks: 0,
            poop_count: 0,
            total_commits: 0,
            total_files: 0,
            total_commands: 0,
            achievements: Vec::new(),
            alive: true,
            birth: Utc::now(),
        }
    }
}

impl Pet {
    pub(crate) fn new(name: &str, now: DateTime<Utc>, rules: &Rules) -> Self {
        Self {
            name: name.to_string(),
            hunger: rules.meter_max,
            happiness: rules.meter_max,
            energy: rules.meter_max,
            health: rules.meter_max,
            weight: rules.start_weight,
            birth: now,
            ..Self::default()
        }
    }

    /// Birth defaults with the name carried over. Only reachable through the
    /// Restart action on a dead pet.
    pub(crate) fn reborn(&self, now: DateTime<Utc>, rules: &Rules) -> Self {
        Self::new(&self.name, now, rules)
    }

    pub(crate) fn clamp_meters(&mut self, rules: &Rules) {
        self.hunger = self.hunger.clamp(0.0, rules.meter_max);
        self.happiness = self.happiness.clamp(0.0, rules.meter_max);
        self.energy = self.energy.clamp(0.0, rules.meter_max);
        self.health = self.health.clamp(0.0, rules.meter_max);
        self.weight = self.weight.max(0.0);
    }
}

/// On-disk record. Unknown fields are ignored on read; missing ones come back
/// from defaults, so old saves keep loading as the schema grows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SaveFile {
    pub(crate) version: u32,
    pub(crate) last_save: DateTime<Utc>,
    pub(crate) pet: Pet,
}

/// Discrete notification for the front end.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub(crate) enum Event {
    LevelUp { level: u32 },
    AchievementUnlocked { name: String },
    Died,
    ActionRefused { reason: String },
    ActionAck { message: String },
    XpGained { amount: u64 },
    RandomEvent { message: String, xp: u64 },
}

/// An event plus its display deadline. Expiry is a timestamp checked on each
/// snapshot refresh, not a scheduled callback.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Notice {
    pub(crate) event: Event,
    pub(crate) expires_at: DateTime<Utc>,
}

/// Read-only view handed to the presentation side after every mutation.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct Snapshot {
    pub(crate) pet: Pet,
    pub(crate) emotion: crate::emotion::Emotion,
    pub(crate) notices: Vec<Notice>,
}

/// What offline catch-up did while the process was away.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub(crate) struct CatchupReport {
    pub(crate) away_minutes: i64,
    pub(crate) hunger_lost: f32,
    pub(crate) happiness_lost: f32,
    pub(crate) energy_lost: f32,
}

impl CatchupReport {
    pub(crate) fn has_anything(&self) -> bool {
        self.away_minutes >= 1
            && (self.hunger_lost >= 1.0 || self.happiness_lost >= 1.0 || self.energy_lost >= 1.0)
    }
}
