use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) pet_name: String,
    pub(crate) seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pet_name: crate::model::DEFAULT_NAME.to_string(),
            seed: 0xC0FFEE_u64,
        }
    }
}

/// Per-meter continuous decay: units lost per minute, and the most a single
/// application may remove (so a week away does not zero a meter in one jump).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub(crate) struct MeterDecay {
    pub(crate) per_min: f32,
    pub(crate) cap: f32,
}

/// All simulation tuning. The meter scale is data, not code: a 0–100
/// percentage pet and a 0–4 hearts pet differ only in this struct, because
/// every threshold is a fraction of `meter_max` and every delta is expressed
/// in scale units.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Rules {
    pub(crate) meter_max: f32,
    pub(crate) start_weight: f32,

    pub(crate) hunger_decay: MeterDecay,
    pub(crate) happiness_decay: MeterDecay,
    pub(crate) energy_decay: MeterDecay,
    pub(crate) catchup_max_mins: i64,

    // probabilistic health check
    pub(crate) starve_chance: f32,
    pub(crate) starve_damage: f32,
    pub(crate) filth_threshold: u32,
    pub(crate) filth_chance: f32,
    pub(crate) filth_damage: f32,
    pub(crate) well_fed_frac: f32,
    pub(crate) regen_chance: f32,
    pub(crate) regen_amount: f32,
    pub(crate) poop_chance: f32,

    // emotion thresholds, fractions of meter_max
    pub(crate) sick_frac: f32,
    pub(crate) hungry_frac: f32,
    pub(crate) sleepy_frac: f32,
    pub(crate) happy_frac: f32,
    pub(crate) sad_frac: f32,

    // feed
    pub(crate) feed_hunger: f32,
    pub(crate) feed_happiness: f32,
    pub(crate) feed_weight: f32,
    pub(crate) feed_full_frac: f32,
    pub(crate) feed_xp: u64,

    // play
    pub(crate) play_energy_frac: f32,
    pub(crate) play_happiness: f32,
    pub(crate) play_energy: f32,
    pub(crate) play_weight: f32,
    pub(crate) play_xp: u64,
    pub(crate) social_chance: f32,

    // rest
    pub(crate) rest_full_frac: f32,
    pub(crate) rest_energy: f32,
    pub(crate) rest_hunger: f32,
    pub(crate) rest_xp: u64,

    // work
    pub(crate) work_energy_frac: f32,
    pub(crate) work_energy: f32,
    pub(crate) work_happiness: f32,
    pub(crate) work_hunger: f32,
    pub(crate) work_xp_min: u64,
    pub(crate) work_xp_max: u64,
    pub(crate) work_files_max: u64,

    // progression
    pub(crate) xp_per_level: u64,
    pub(crate) level_bonus_hunger: f32,
    pub(crate) level_bonus_happiness: f32,
    pub(crate) level_bonus_energy: f32,

    // random events
    pub(crate) event_chance: f32,
    pub(crate) event_mood_frac: f32,

    // cadences, seconds
    pub(crate) decay_secs: u64,
    pub(crate) aging_secs: u64,
    pub(crate) health_secs: u64,
    pub(crate) poop_secs: u64,
    pub(crate) autosave_secs: u64,
    pub(crate) event_secs: u64,

    pub(crate) notice_ttl_secs: i64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            meter_max: 100.0,
            start_weight: 20.0,

            hunger_decay: MeterDecay {
                per_min: 0.5,
                cap: 50.0,
            },
            happiness_decay: MeterDecay {
                per_min: 0.3,
                cap: 40.0,
            },
            energy_decay: MeterDecay {
                per_min: 0.4,
                cap: 45.0,
            },
            catchup_max_mins: 7 * 24 * 60,

            starve_chance: 0.35,
            starve_damage: 5.0,
            filth_threshold: 3,
            filth_chance: 0.30,
            filth_damage: 4.0,
            well_fed_frac: 0.5,
            regen_chance: 0.25,
            regen_amount: 2.0,
            poop_chance: 0.25,

            sick_frac: 0.25,
            hungry_frac: 0.30,
            sleepy_frac: 0.30,
            happy_frac: 0.80,
            sad_frac: 0.40,

            feed_hunger: 30.0,
            feed_happiness: 5.0,
            feed_weight: 0.6,
            feed_full_frac: 0.95,
            feed_xp: 10,

            play_energy_frac: 0.20,
            play_happiness: 25.0,
            play_energy: 10.0,
            play_weight: 0.3,
            play_xp: 15,
            social_chance: 0.2,

            rest_full_frac: 0.95,
            rest_energy: 40.0,
            rest_hunger: 5.0,
            rest_xp: 8,

            work_energy_frac: 0.15,
            work_energy: 15.0,
            work_happiness: 20.0,
            work_hunger: 10.0,
            work_xp_min: 100,
            work_xp_max: 500,
            work_files_max: 5,

            xp_per_level: 1000,
            level_bonus_hunger: 20.0,
            level_bonus_happiness: 30.0,
            level_bonus_energy: 25.0,

            event_chance: 0.3,
            event_mood_frac: 0.5,

            decay_secs: 1,
            aging_secs: 60,
            health_secs: 15,
            poop_secs: 45,
            autosave_secs: 5,
            event_secs: 30,

            notice_ttl_secs: 6,
        }
    }
}

impl Rules {
    /// A hand-edited rules file may hold values the engine cannot run with:
    /// `gen_range` needs non-empty ranges and the meter scale must be
    /// positive. Normalize instead of crashing the session.
    fn sanitized(mut self) -> Self {
        if !(self.meter_max > 0.0) {
            self.meter_max = Self::default().meter_max;
        }
        self.work_files_max = self.work_files_max.max(1);
        self.work_xp_max = self.work_xp_max.max(self.work_xp_min);
        self
    }
}

pub(crate) struct Paths {
    pub(crate) save_path: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) rules_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "codepet", "Codepet")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        save_path: dir.join("save.json"),
        settings_path: dir.join("settings.json"),
        rules_path: dir.join("rules.json"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
        tracing::warn!(path = %path.display(), "unreadable settings, using defaults");
    }
    Settings::default()
}

pub(crate) fn load_rules(path: &Path) -> Rules {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Rules>(&s) {
            return v.sanitized();
        }
        tracing::warn!(path = %path.display(), "unreadable rules, using defaults");
    }
    Rules::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // Best-effort atomic replace on same filesystem.
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)?;
    Ok(())
}
