use crate::config::Rules;
use crate::model::{Event, Pet};
use rand::Rng;

/// Total XP required to leave `level`. XP is cumulative and never reset, so
/// the level is derivable from XP alone and can only go up.
pub(crate) fn xp_threshold(level: u32, rules: &Rules) -> u64 {
    rules.xp_per_level * u64::from(level)
}

fn level_milestone(level: u32) -> Option<&'static str> {
    match level {
        10 => Some("Rising Star"),
        25 => Some("Veteran Coder"),
        50 => Some("Master Developer"),
        100 => Some("LEGENDARY"),
        _ => None,
    }
}

/// Add XP and resolve level-ups. One big grant may cross several thresholds;
/// each crossing is its own event and restores a slice of every meter.
pub(crate) fn grant_xp(pet: &mut Pet, amount: u64, rules: &Rules) -> Vec<Event> {
    pet.xp += amount;
    let mut events = vec![Event::XpGained { amount }];

    while pet.xp >= xp_threshold(pet.level, rules) {
        pet.level += 1;
        pet.hunger += rules.level_bonus_hunger;
        pet.happiness += rules.level_bonus_happiness;
        pet.energy += rules.level_bonus_energy;
        pet.clamp_meters(rules);
        events.push(Event::LevelUp { level: pet.level });
        if let Some(name) = level_milestone(pet.level) {
            events.extend(unlock(pet, name));
        }
    }
    events
}

/// Append-only, idempotent unlock. Re-unlocking yields nothing.
pub(crate) fn unlock(pet: &mut Pet, name: &str) -> Option<Event> {
    if pet.achievements.iter().any(|a| a == name) {
        return None;
    }
    pet.achievements.push(name.to_string());
    Some(Event::AchievementUnlocked {
        name: name.to_string(),
    })
}

const RANDOM_EVENTS: [(&str, u64); 4] = [
    ("Found a shiny bug!", 50),
    ("Feeling inspired!", 30),
    ("Great idea!", 40),
    ("Code looks beautiful!", 35),
];

/// Periodic roll for a small windfall. Only fires when the pet is in good
/// enough spirits to enjoy it.
pub(crate) fn random_event<R: Rng>(pet: &mut Pet, rng: &mut R, rules: &Rules) -> Vec<Event> {
    if !pet.alive || rng.gen::<f32>() >= rules.event_chance {
        return Vec::new();
    }
    let floor = rules.event_mood_frac * rules.meter_max;
    if pet.energy <= floor || pet.happiness <= floor {
        return Vec::new();
    }
    let (message, xp) = RANDOM_EVENTS[rng.gen_range(0..RANDOM_EVENTS.len())];
    let mut events = vec![Event::RandomEvent {
        message: message.to_string(),
        xp,
    }];
    events.extend(grant_xp(pet, xp, rules));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};

    fn fresh() -> (Pet, Rules) {
        let rules = Rules::default();
        let pet = Pet::new("Test", Utc::now(), &rules);
        (pet, rules)
    }

    fn level_ups(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, Event::LevelUp { .. }))
            .count()
    }

    #[test]
    fn single_grant_below_threshold_does_not_level() {
        let (mut pet, rules) = fresh();
        let events = grant_xp(&mut pet, 999, &rules);
        assert_eq!(pet.level, 1);
        assert_eq!(level_ups(&events), 0);
        assert_eq!(pet.xp, 999);
    }

    #[test]
    fn crossing_two_thresholds_emits_two_level_ups() {
        let (mut pet, rules) = fresh();
        // 2500 total crosses 1000 (level 2) and 2000 (level 3) at once.
        let events = grant_xp(&mut pet, 2500, &rules);
        assert_eq!(pet.level, 3);
        assert_eq!(level_ups(&events), 2);
        assert_eq!(pet.xp, 2500);
    }

    #[test]
    fn level_up_restores_meters_clamped() {
        let (mut pet, rules) = fresh();
        pet.hunger = 10.0;
        pet.happiness = 95.0;
        pet.energy = 40.0;
        grant_xp(&mut pet, 1000, &rules);
        assert!((pet.hunger - 30.0).abs() < f32::EPSILON);
        assert!((pet.happiness - rules.meter_max).abs() < f32::EPSILON);
        assert!((pet.energy - 65.0).abs() < f32::EPSILON);
    }

    #[test]
    fn level_never_decreases_and_xp_accumulates() {
        let (mut pet, rules) = fresh();
        let mut last_level = pet.level;
        let mut last_xp = pet.xp;
        for amount in [10, 500, 1500, 3, 4000, 1] {
            grant_xp(&mut pet, amount, &rules);
            assert!(pet.level >= last_level);
            assert!(pet.xp >= last_xp);
            last_level = pet.level;
            last_xp = pet.xp;
        }
    }

    #[test]
    fn unlock_is_idempotent_and_ordered() {
        let (mut pet, _rules) = fresh();
        assert!(unlock(&mut pet, "First Meal").is_some());
        assert!(unlock(&mut pet, "First Commit").is_some());
        assert!(unlock(&mut pet, "First Meal").is_none());
        assert_eq!(pet.achievements, vec!["First Meal", "First Commit"]);
    }

    #[test]
    fn level_ten_milestone_unlocks_once() {
        let (mut pet, rules) = fresh();
        // Enough total XP to sail past level 10: sum of 1000*k for k=1..10.
        let events = grant_xp(&mut pet, 55_000, &rules);
        assert!(pet.level > 10);
        let rising: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(e, Event::AchievementUnlocked { name } if name == "Rising Star")
            })
            .collect();
        assert_eq!(rising.len(), 1);
    }

    #[test]
    fn random_event_respects_mood_gate() {
        let (mut pet, rules) = fresh();
        pet.energy = 10.0;
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(random_event(&mut pet, &mut rng, &rules).is_empty());
        }
        assert_eq!(pet.xp, 0);
    }

    #[test]
    fn random_event_grants_listed_xp() {
        let (mut pet, rules) = fresh();
        let mut rng = StdRng::seed_from_u64(3);
        let mut fired = false;
        for _ in 0..100 {
            let events = random_event(&mut pet, &mut rng, &rules);
            if let Some(Event::RandomEvent { xp, .. }) = events.first() {
                fired = true;
                assert!(events.contains(&Event::XpGained { amount: *xp }));
            }
        }
        assert!(fired);
        assert!(pet.xp > 0);
    }
}
