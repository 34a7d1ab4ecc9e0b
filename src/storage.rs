use crate::config::{atomic_rename, Rules};
use crate::model::{Pet, SaveFile, SAVE_VERSION};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::{fs, path::Path};

/// Read the save file, or hand back a fresh pet. Corruption and schema
/// mismatches cost the save, never the session.
pub(crate) fn load_or_init(
    path: &Path,
    name: &str,
    now: DateTime<Utc>,
    rules: &Rules,
) -> (Pet, Option<DateTime<Utc>>) {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<SaveFile>(&s) {
            Ok(save) => {
                let mut pet = save.pet;
                // A tampered save, or one written under a different meter
                // scale, must not smuggle out-of-range values into the
                // simulation.
                pet.clamp_meters(rules);
                if pet.health <= 0.0 {
                    pet.alive = false;
                }
                return (pet, Some(save.last_save));
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "corrupt save, starting fresh");
            }
        },
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), %err, "unreadable save, starting fresh");
        }
        Err(_) => {}
    }
    (Pet::new(name, now, rules), None)
}

/// Serialize a snapshot of the pet and rename it into place. `last_save` is
/// stamped here so catch-up always measures from the most recent write.
pub(crate) fn save_atomic(path: &Path, pet: &Pet, now: DateTime<Utc>) -> Result<()> {
    let save = SaveFile {
        version: SAVE_VERSION,
        last_save: now,
        pet: pet.clone(),
    };
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(&save)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}
