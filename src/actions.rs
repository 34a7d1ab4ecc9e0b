use crate::config::Rules;
use crate::model::{Event, Pet};
use crate::progress;
use chrono::{DateTime, Utc};
use rand::Rng;

/// Player intents, delivered as bare named events by the input side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Feed,
    Play,
    Rest,
    Work,
    Clean,
    Restart,
}

impl Action {
    pub(crate) fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "feed" | "f" => Some(Self::Feed),
            "play" | "p" => Some(Self::Play),
            "rest" | "sleep" | "s" => Some(Self::Rest),
            "work" | "code" | "c" => Some(Self::Work),
            "clean" | "k" => Some(Self::Clean),
            "restart" | "n" => Some(Self::Restart),
            _ => None,
        }
    }
}

fn refused(reason: &str) -> Vec<Event> {
    vec![Event::ActionRefused {
        reason: reason.to_string(),
    }]
}

fn ack(message: &str) -> Event {
    Event::ActionAck {
        message: message.to_string(),
    }
}

/// Apply one player action. Guards surface as refusal events, never errors.
/// A dead pet ignores everything but Restart, silently.
pub(crate) fn apply<R: Rng>(
    pet: &mut Pet,
    action: Action,
    rng: &mut R,
    rules: &Rules,
    now: DateTime<Utc>,
) -> Vec<Event> {
    if !pet.alive && action != Action::Restart {
        return Vec::new();
    }

    match action {
        Action::Feed => feed(pet, rules),
        Action::Play => play(pet, rng, rules),
        Action::Rest => rest(pet, rules),
        Action::Work => work(pet, rng, rules),
        Action::Clean => clean(pet),
        Action::Restart => restart(pet, rules, now),
    }
}

fn feed(pet: &mut Pet, rules: &Rules) -> Vec<Event> {
    if pet.hunger >= rules.feed_full_frac * rules.meter_max {
        // Acknowledged no-op, not a refusal: feeding a full pet is allowed.
        return vec![ack("I'm already full!")];
    }
    pet.hunger += rules.feed_hunger;
    pet.happiness += rules.feed_happiness;
    pet.weight += rules.feed_weight;
    pet.clamp_meters(rules);
    pet.total_commands += 1;

    let mut events = vec![ack("Nom nom nom! Thanks!")];
    events.extend(progress::grant_xp(pet, rules.feed_xp, rules));
    events.extend(progress::unlock(pet, "First Meal"));
    events
}

fn play<R: Rng>(pet: &mut Pet, rng: &mut R, rules: &Rules) -> Vec<Event> {
    if pet.energy < rules.play_energy_frac * rules.meter_max {
        return refused("Too tired to play... need sleep.");
    }
    pet.happiness += rules.play_happiness;
    pet.energy -= rules.play_energy;
    pet.weight -= rules.play_weight;
    pet.clamp_meters(rules);
    pet.total_commands += 1;

    let mut events = vec![ack("Wheee! That was fun!")];
    events.extend(progress::grant_xp(pet, rules.play_xp, rules));
    if rng.gen::<f32>() < rules.social_chance {
        events.extend(progress::unlock(pet, "Social Butterfly"));
    }
    events
}

fn rest(pet: &mut Pet, rules: &Rules) -> Vec<Event> {
    if pet.energy >= rules.rest_full_frac * rules.meter_max {
        return refused("I'm not tired yet!");
    }
    pet.energy += rules.rest_energy;
    pet.hunger -= rules.rest_hunger;
    pet.clamp_meters(rules);
    pet.total_commands += 1;

    let mut events = vec![ack("Zzz... *yawn* Refreshed!")];
    events.extend(progress::grant_xp(pet, rules.rest_xp, rules));
    events
}

fn work<R: Rng>(pet: &mut Pet, rng: &mut R, rules: &Rules) -> Vec<Event> {
    if pet.energy < rules.work_energy_frac * rules.meter_max {
        return refused("Too exhausted to code! Need rest.");
    }
    pet.energy -= rules.work_energy;
    pet.happiness += rules.work_happiness;
    pet.hunger -= rules.work_hunger;
    pet.clamp_meters(rules);
    pet.total_commands += 1;
    pet.total_commits += 1;
    pet.total_files += rng.gen_range(1..=rules.work_files_max);

    let xp_gain = rng.gen_range(rules.work_xp_min..=rules.work_xp_max);
    let mut events = vec![ack("SHIPPED!")];
    events.extend(progress::grant_xp(pet, xp_gain, rules));
    if let Some(name) = commit_milestone(pet.total_commits) {
        events.extend(progress::unlock(pet, name));
    }
    events
}

fn commit_milestone(commits: u64) -> Option<&'static str> {
    match commits {
        1 => Some("First Commit"),
        10 => Some("Committed"),
        50 => Some("Git Master"),
        100 => Some("Bug Squasher"),
        _ => None,
    }
}

fn clean(pet: &mut Pet) -> Vec<Event> {
    if pet.poop_count == 0 {
        return Vec::new();
    }
    pet.poop_count = 0;
    pet.total_commands += 1;
    vec![ack("All cleaned up.")]
}

fn restart(pet: &mut Pet, rules: &Rules, now: DateTime<Utc>) -> Vec<Event> {
    if pet.alive {
        return refused("Still going strong!");
    }
    *pet = pet.reborn(now, rules);
    vec![ack("A new egg hatches...")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn fresh() -> (Pet, Rules, StdRng) {
        let rules = Rules::default();
        let pet = Pet::new("Test", Utc::now(), &rules);
        (pet, rules, StdRng::seed_from_u64(42))
    }

    fn has_refusal(events: &[Event]) -> bool {
        events
            .iter()
            .any(|e| matches!(e, Event::ActionRefused { .. }))
    }

    #[test]
    fn feed_at_max_hunger_is_acknowledged_noop() {
        let (mut pet, rules, mut rng) = fresh();
        let before = pet.clone();
        let events = apply(&mut pet, Action::Feed, &mut rng, &rules, Utc::now());
        assert!(matches!(events[0], Event::ActionAck { .. }));
        assert!(!has_refusal(&events));
        assert!((pet.hunger - before.hunger).abs() < f32::EPSILON);
        assert!((pet.weight - before.weight).abs() < f32::EPSILON);
        assert_eq!(pet.xp, 0);
    }

    #[test]
    fn feed_raises_hunger_weight_and_xp() {
        let (mut pet, rules, mut rng) = fresh();
        pet.hunger = 40.0;
        let events = apply(&mut pet, Action::Feed, &mut rng, &rules, Utc::now());
        assert!((pet.hunger - 70.0).abs() < f32::EPSILON);
        assert!((pet.weight - 20.6).abs() < 0.001);
        assert_eq!(pet.xp, rules.feed_xp);
        assert!(events.contains(&Event::AchievementUnlocked {
            name: "First Meal".to_string()
        }));
    }

    #[test]
    fn second_feed_does_not_reunlock_first_meal() {
        let (mut pet, rules, mut rng) = fresh();
        pet.hunger = 20.0;
        apply(&mut pet, Action::Feed, &mut rng, &rules, Utc::now());
        pet.hunger = 20.0;
        let events = apply(&mut pet, Action::Feed, &mut rng, &rules, Utc::now());
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::AchievementUnlocked { .. })));
        assert_eq!(
            pet.achievements
                .iter()
                .filter(|a| *a == "First Meal")
                .count(),
            1
        );
    }

    #[test]
    fn play_refused_when_exhausted_mutates_nothing() {
        let (mut pet, rules, mut rng) = fresh();
        pet.energy = 10.0;
        let before = pet.clone();
        let events = apply(&mut pet, Action::Play, &mut rng, &rules, Utc::now());
        assert!(has_refusal(&events));
        assert!((pet.happiness - before.happiness).abs() < f32::EPSILON);
        assert!((pet.energy - before.energy).abs() < f32::EPSILON);
        assert!((pet.weight - before.weight).abs() < f32::EPSILON);
        assert_eq!(pet.xp, before.xp);
        assert_eq!(pet.total_commands, before.total_commands);
    }

    #[test]
    fn play_trades_energy_for_happiness() {
        let (mut pet, rules, mut rng) = fresh();
        pet.happiness = 50.0;
        apply(&mut pet, Action::Play, &mut rng, &rules, Utc::now());
        assert!((pet.happiness - 75.0).abs() < f32::EPSILON);
        assert!((pet.energy - 90.0).abs() < f32::EPSILON);
        assert!((pet.weight - 19.7).abs() < 0.001);
        assert_eq!(pet.xp, rules.play_xp);
    }

    #[test]
    fn rest_refused_at_full_energy() {
        let (mut pet, rules, mut rng) = fresh();
        let events = apply(&mut pet, Action::Rest, &mut rng, &rules, Utc::now());
        assert!(has_refusal(&events));
    }

    #[test]
    fn rest_restores_energy_and_costs_hunger() {
        let (mut pet, rules, mut rng) = fresh();
        pet.energy = 30.0;
        apply(&mut pet, Action::Rest, &mut rng, &rules, Utc::now());
        assert!((pet.energy - 70.0).abs() < f32::EPSILON);
        assert!((pet.hunger - 95.0).abs() < f32::EPSILON);
        assert_eq!(pet.xp, rules.rest_xp);
    }

    #[test]
    fn work_applies_deltas_and_randomized_rewards() {
        let (mut pet, rules, mut rng) = fresh();
        pet.happiness = 50.0;
        let events = apply(&mut pet, Action::Work, &mut rng, &rules, Utc::now());
        assert!((pet.energy - 85.0).abs() < f32::EPSILON);
        assert!((pet.happiness - 70.0).abs() < f32::EPSILON);
        assert!((pet.hunger - 90.0).abs() < f32::EPSILON);
        assert_eq!(pet.total_commits, 1);
        assert!((1..=rules.work_files_max).contains(&pet.total_files));
        assert!((rules.work_xp_min..=rules.work_xp_max).contains(&pet.xp));
        assert!(events.contains(&Event::AchievementUnlocked {
            name: "First Commit".to_string()
        }));
    }

    #[test]
    fn work_with_pinned_xp_range_grants_exactly_that() {
        let (mut pet, mut rules, mut rng) = fresh();
        rules.work_xp_min = 300;
        rules.work_xp_max = 300;
        rules.work_files_max = 1;
        pet.xp = 900;
        let events = apply(&mut pet, Action::Work, &mut rng, &rules, Utc::now());
        assert_eq!(pet.xp, 1200);
        assert_eq!(pet.total_files, 1);
        assert!((pet.energy - 85.0).abs() < f32::EPSILON);
        // 1200 total crosses the level-1 threshold.
        assert_eq!(pet.level, 2);
        assert!(events.contains(&Event::LevelUp { level: 2 }));
    }

    #[test]
    fn big_work_reward_can_cascade_a_level() {
        let (mut pet, rules, mut rng) = fresh();
        pet.xp = 900;
        apply(&mut pet, Action::Work, &mut rng, &rules, Utc::now());
        if pet.xp >= 1000 {
            assert_eq!(pet.level, 2);
        }
    }

    #[test]
    fn commit_milestones_fire_at_thresholds() {
        let (mut pet, rules, mut rng) = fresh();
        for _ in 0..10 {
            pet.energy = rules.meter_max;
            apply(&mut pet, Action::Work, &mut rng, &rules, Utc::now());
        }
        assert!(pet.achievements.iter().any(|a| a == "First Commit"));
        assert!(pet.achievements.iter().any(|a| a == "Committed"));
    }

    #[test]
    fn clean_resets_poop_and_is_silent_when_clean() {
        let (mut pet, rules, mut rng) = fresh();
        assert!(apply(&mut pet, Action::Clean, &mut rng, &rules, Utc::now()).is_empty());
        pet.poop_count = 4;
        let events = apply(&mut pet, Action::Clean, &mut rng, &rules, Utc::now());
        assert!(matches!(events[0], Event::ActionAck { .. }));
        assert_eq!(pet.poop_count, 0);
    }

    #[test]
    fn dead_pet_ignores_feed_entirely() {
        let (mut pet, rules, mut rng) = fresh();
        pet.alive = false;
        pet.hunger = 10.0;
        let events = apply(&mut pet, Action::Feed, &mut rng, &rules, Utc::now());
        assert!(events.is_empty());
        assert!((pet.hunger - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn restart_only_when_dead_and_keeps_name() {
        let (mut pet, rules, mut rng) = fresh();
        let events = apply(&mut pet, Action::Restart, &mut rng, &rules, Utc::now());
        assert!(has_refusal(&events));

        pet.alive = false;
        pet.level = 7;
        pet.achievements.push("First Meal".to_string());
        let now = Utc::now();
        let events = apply(&mut pet, Action::Restart, &mut rng, &rules, now);
        assert!(matches!(events[0], Event::ActionAck { .. }));
        assert!(pet.alive);
        assert_eq!(pet.name, "Test");
        assert_eq!(pet.level, 1);
        assert!(pet.achievements.is_empty());
        assert_eq!(pet.birth, now);
    }

    #[test]
    fn achievements_never_shrink_across_mixed_actions() {
        let (mut pet, rules, mut rng) = fresh();
        let mut high_water = 0usize;
        for i in 0..200 {
            pet.hunger = 50.0;
            pet.energy = rules.meter_max;
            let action = match i % 4 {
                0 => Action::Feed,
                1 => Action::Play,
                2 => Action::Work,
                _ => Action::Clean,
            };
            apply(&mut pet, action, &mut rng, &rules, Utc::now());
            let unique: std::collections::HashSet<_> = pet.achievements.iter().collect();
            assert_eq!(unique.len(), pet.achievements.len());
            assert!(pet.achievements.len() >= high_water);
            high_water = pet.achievements.len();
        }
    }
}
