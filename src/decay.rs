use crate::config::{MeterDecay, Rules};
use crate::model::{CatchupReport, Event, Pet};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;

fn minutes(elapsed: Duration) -> f32 {
    elapsed.as_secs_f32() / 60.0
}

fn decay_step(value: f32, decay: MeterDecay, mins: f32, max: f32) -> f32 {
    let loss = (decay.per_min * mins).min(decay.cap);
    (value - loss).clamp(0.0, max)
}

/// Time-based meter decay. Called every fine tick while running, and once as
/// a batch for offline catch-up; a single application never removes more than
/// each meter's configured cap.
pub(crate) fn apply_continuous(pet: &mut Pet, elapsed: Duration, rules: &Rules) {
    if !pet.alive {
        return;
    }
    let mins = minutes(elapsed);
    pet.hunger = decay_step(pet.hunger, rules.hunger_decay, mins, rules.meter_max);
    pet.happiness = decay_step(pet.happiness, rules.happiness_decay, mins, rules.meter_max);
    pet.energy = decay_step(pet.energy, rules.energy_decay, mins, rules.meter_max);
}

/// One-shot reconciliation for the interval the process was not running.
/// A stored timestamp in the future counts as zero elapsed time.
pub(crate) fn apply_offline_catchup(
    pet: &mut Pet,
    last_save: DateTime<Utc>,
    now: DateTime<Utc>,
    rules: &Rules,
) -> CatchupReport {
    let away = (now - last_save)
        .num_seconds()
        .clamp(0, rules.catchup_max_mins.saturating_mul(60));

    let before = pet.clone();
    apply_continuous(pet, Duration::from_secs(away as u64), rules);

    CatchupReport {
        away_minutes: away / 60,
        hunger_lost: before.hunger - pet.hunger,
        happiness_lost: before.happiness - pet.happiness,
        energy_lost: before.energy - pet.energy,
    }
}

/// Probabilistic health transitions: starvation and filth hurt, a fed and
/// clean pet slowly recovers. Health hitting zero is terminal until Restart.
pub(crate) fn health_check<R: Rng>(pet: &mut Pet, rng: &mut R, rules: &Rules) -> Vec<Event> {
    if !pet.alive {
        return Vec::new();
    }

    if pet.hunger <= 0.0 && rng.gen::<f32>() < rules.starve_chance {
        pet.health -= rules.starve_damage;
    }
    if pet.poop_count > rules.filth_threshold && rng.gen::<f32>() < rules.filth_chance {
        pet.health -= rules.filth_damage;
    } else if pet.hunger >= rules.well_fed_frac * rules.meter_max
        && pet.poop_count == 0
        && rng.gen::<f32>() < rules.regen_chance
    {
        pet.health += rules.regen_amount;
    }
    pet.health = pet.health.clamp(0.0, rules.meter_max);

    if pet.health <= 0.0 {
        pet.alive = false;
        return vec![Event::Died];
    }
    Vec::new()
}

pub(crate) fn poop_roll<R: Rng>(pet: &mut Pet, rng: &mut R, rules: &Rules) {
    if pet.alive && rng.gen::<f32>() < rules.poop_chance {
        pet.poop_count += 1;
    }
}

pub(crate) fn age_tick(pet: &mut Pet) {
    if pet.alive {
        pet.age_ticks += 1;
    }
}
