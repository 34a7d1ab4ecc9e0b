use crate::config::Rules;
use crate::model::Pet;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) enum Emotion {
    Normal,
    Happy,
    Sad,
    Hungry,
    Sick,
    Sleeping,
    Dead,
}

/// Map the current meters to a display emotion. Pure and total; severity
/// wins, so a sick pet reads as sick even when it is also hungry and sad.
pub(crate) fn resolve(pet: &Pet, rules: &Rules) -> Emotion {
    let max = rules.meter_max;
    if !pet.alive {
        return Emotion::Dead;
    }
    if pet.health <= rules.sick_frac * max {
        return Emotion::Sick;
    }
    if pet.hunger <= rules.hungry_frac * max {
        return Emotion::Hungry;
    }
    if pet.energy <= rules.sleepy_frac * max {
        return Emotion::Sleeping;
    }
    if pet.happiness >= rules.happy_frac * max
        && pet.hunger >= rules.happy_frac * max
        && pet.health >= rules.happy_frac * max
    {
        return Emotion::Happy;
    }
    if pet.happiness < rules.sad_frac * max {
        return Emotion::Sad;
    }
    Emotion::Normal
}
