use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{
    require_in_range, require_non_negative, require_positive, ActionTiming, ConfigError,
    MotionTuning, SchedulerTuning,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum TuningError {
    #[error("failed to read tuning file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse tuning json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Every entity type's immutable parameters, fixed for the whole encounter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TuningTable {
    pub(crate) player: PlayerTuning,
    pub(crate) juggernaut: JuggernautTuning,
    pub(crate) warden: WardenTuning,
}

impl TuningTable {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.player.validate()?;
        self.juggernaut.validate()?;
        self.warden.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PlayerTuning {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) collision_tolerance: f64,
    pub(crate) max_health: f64,
    pub(crate) max_energy: f64,
    pub(crate) motion: MotionTuning,
    pub(crate) deceleration: f64,
    pub(crate) knockback_distance: f64,
    pub(crate) knockback_ms: f64,
    pub(crate) invincibility_ms: f64,
    pub(crate) strike_damage: f64,
    pub(crate) strike_range: f64,
    pub(crate) strike_cooldown_ms: f64,
    pub(crate) energy_per_hit: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 28.0,
            height: 28.0,
            collision_tolerance: 18.0,
            max_health: 100.0,
            max_energy: 100.0,
            motion: MotionTuning {
                distance: 260.0,
                time_to_velocity: 1.0,
                time_to_accelerate: 0.12,
            },
            deceleration: 1800.0,
            knockback_distance: 96.0,
            knockback_ms: 200.0,
            invincibility_ms: 800.0,
            strike_damage: 6.0,
            strike_range: 56.0,
            strike_cooldown_ms: 350.0,
            energy_per_hit: 8.0,
        }
    }
}

impl PlayerTuning {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        const CONTEXT: &str = "player";
        require_positive(CONTEXT, "width", self.width)?;
        require_positive(CONTEXT, "height", self.height)?;
        require_non_negative(CONTEXT, "collision_tolerance", self.collision_tolerance)?;
        require_positive(CONTEXT, "max_health", self.max_health)?;
        require_positive(CONTEXT, "max_energy", self.max_energy)?;
        self.motion.validate("player.motion")?;
        require_positive(CONTEXT, "deceleration", self.deceleration)?;
        require_non_negative(CONTEXT, "knockback_distance", self.knockback_distance)?;
        require_positive(CONTEXT, "knockback_ms", self.knockback_ms)?;
        require_non_negative(CONTEXT, "invincibility_ms", self.invincibility_ms)?;
        require_non_negative(CONTEXT, "strike_damage", self.strike_damage)?;
        require_positive(CONTEXT, "strike_range", self.strike_range)?;
        require_non_negative(CONTEXT, "strike_cooldown_ms", self.strike_cooldown_ms)?;
        require_non_negative(CONTEXT, "energy_per_hit", self.energy_per_hit)?;
        Ok(())
    }
}

/// Size, health and chase parameters every boss carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BossBodyTuning {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) collision_tolerance: f64,
    pub(crate) max_health: f64,
    pub(crate) chase: MotionTuning,
    /// Chase stops closing in once the centers are this close.
    pub(crate) hold_distance: f64,
    pub(crate) contact_damage: f64,
    pub(crate) seed: Option<u64>,
}

impl BossBodyTuning {
    fn validate(&self, context: &'static str) -> Result<(), ConfigError> {
        require_positive(context, "width", self.width)?;
        require_positive(context, "height", self.height)?;
        require_non_negative(context, "collision_tolerance", self.collision_tolerance)?;
        require_positive(context, "max_health", self.max_health)?;
        self.chase.validate(context)?;
        require_non_negative(context, "hold_distance", self.hold_distance)?;
        require_non_negative(context, "contact_damage", self.contact_damage)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JuggernautTuning {
    pub(crate) body: BossBodyTuning,
    pub(crate) scheduler: SchedulerTuning,
    pub(crate) charge: ActionTiming,
    pub(crate) charge_motion: MotionTuning,
    pub(crate) charge_contact_damage: f64,
    pub(crate) stun_ms: f64,
    pub(crate) rage_distance_bonus: f64,
    pub(crate) max_rage: u32,
    /// Launch stage; the remaining stages use their own durations.
    pub(crate) leap: ActionTiming,
    pub(crate) leap_target_ms: f64,
    pub(crate) leap_land_ms: f64,
    pub(crate) leap_motion: MotionTuning,
    pub(crate) shockwave_radius: f64,
    pub(crate) shockwave_damage: f64,
    pub(crate) spit_cooldown_ms: f64,
    pub(crate) spit_speed: f64,
    pub(crate) spit_damage: f64,
}

impl Default for JuggernautTuning {
    fn default() -> Self {
        Self {
            body: BossBodyTuning {
                width: 64.0,
                height: 64.0,
                collision_tolerance: 12.0,
                max_health: 400.0,
                chase: MotionTuning {
                    distance: 90.0,
                    time_to_velocity: 1.0,
                    time_to_accelerate: 0.4,
                },
                hold_distance: 24.0,
                contact_damage: 8.0,
                seed: None,
            },
            scheduler: SchedulerTuning {
                lockout_ms: 1500.0,
                phase_threshold: 0.5,
                escalated_cooldown_multiplier: 0.6,
            },
            charge: ActionTiming::new(1400.0, Some(6000.0)),
            charge_motion: MotionTuning {
                distance: 480.0,
                time_to_velocity: 1.0,
                time_to_accelerate: 0.25,
            },
            charge_contact_damage: 18.0,
            stun_ms: 2200.0,
            rage_distance_bonus: 0.15,
            max_rage: 4,
            leap: ActionTiming::new(600.0, Some(9000.0)),
            leap_target_ms: 900.0,
            leap_land_ms: 400.0,
            leap_motion: MotionTuning {
                distance: 320.0,
                time_to_velocity: 1.0,
                time_to_accelerate: 0.2,
            },
            shockwave_radius: 120.0,
            shockwave_damage: 14.0,
            spit_cooldown_ms: 2500.0,
            spit_speed: 260.0,
            spit_damage: 6.0,
        }
    }
}

impl JuggernautTuning {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        const CONTEXT: &str = "juggernaut";
        self.body.validate(CONTEXT)?;
        self.scheduler.validate(CONTEXT)?;
        self.charge.validate("juggernaut.charge")?;
        self.charge_motion.validate("juggernaut.charge_motion")?;
        require_non_negative(CONTEXT, "charge_contact_damage", self.charge_contact_damage)?;
        require_positive(CONTEXT, "stun_ms", self.stun_ms)?;
        require_non_negative(CONTEXT, "rage_distance_bonus", self.rage_distance_bonus)?;
        self.leap.validate("juggernaut.leap")?;
        require_positive(CONTEXT, "leap_target_ms", self.leap_target_ms)?;
        require_positive(CONTEXT, "leap_land_ms", self.leap_land_ms)?;
        self.leap_motion.validate("juggernaut.leap_motion")?;
        require_non_negative(CONTEXT, "shockwave_radius", self.shockwave_radius)?;
        require_non_negative(CONTEXT, "shockwave_damage", self.shockwave_damage)?;
        require_positive(CONTEXT, "spit_cooldown_ms", self.spit_cooldown_ms)?;
        require_positive(CONTEXT, "spit_speed", self.spit_speed)?;
        require_non_negative(CONTEXT, "spit_damage", self.spit_damage)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WardenTuning {
    pub(crate) body: BossBodyTuning,
    pub(crate) scheduler: SchedulerTuning,
    pub(crate) orbit: ActionTiming,
    pub(crate) orbit_radius: f64,
    pub(crate) orbit_angular_speed: f64,
    pub(crate) sleep: ActionTiming,
    pub(crate) sleep_damage_multiplier: f64,
    pub(crate) volley: ActionTiming,
    pub(crate) volley_projectiles: u32,
    pub(crate) volley_spread: f64,
    pub(crate) max_shards: u32,
    pub(crate) projectile_speed: f64,
    pub(crate) projectile_damage: f64,
}

impl Default for WardenTuning {
    fn default() -> Self {
        Self {
            body: BossBodyTuning {
                width: 48.0,
                height: 48.0,
                collision_tolerance: 12.0,
                max_health: 300.0,
                chase: MotionTuning {
                    distance: 70.0,
                    time_to_velocity: 1.0,
                    time_to_accelerate: 0.5,
                },
                hold_distance: 140.0,
                contact_damage: 10.0,
                seed: None,
            },
            scheduler: SchedulerTuning {
                lockout_ms: 1200.0,
                phase_threshold: 0.5,
                escalated_cooldown_multiplier: 0.7,
            },
            orbit: ActionTiming::new(3000.0, Some(7000.0)),
            orbit_radius: 150.0,
            orbit_angular_speed: 2.2,
            sleep: ActionTiming::new(2500.0, Some(12000.0)),
            sleep_damage_multiplier: 2.0,
            volley: ActionTiming::new(500.0, None),
            volley_projectiles: 5,
            volley_spread: 0.9,
            max_shards: 3,
            projectile_speed: 220.0,
            projectile_damage: 7.0,
        }
    }
}

impl WardenTuning {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        const CONTEXT: &str = "warden";
        self.body.validate(CONTEXT)?;
        self.scheduler.validate(CONTEXT)?;
        self.orbit.validate("warden.orbit")?;
        require_positive(CONTEXT, "orbit_radius", self.orbit_radius)?;
        require_positive(CONTEXT, "orbit_angular_speed", self.orbit_angular_speed)?;
        self.sleep.validate("warden.sleep")?;
        require_positive(CONTEXT, "sleep_damage_multiplier", self.sleep_damage_multiplier)?;
        self.volley.validate("warden.volley")?;
        require_positive(
            CONTEXT,
            "volley_projectiles",
            f64::from(self.volley_projectiles),
        )?;
        require_in_range(
            CONTEXT,
            "volley_spread",
            self.volley_spread,
            0.0,
            std::f64::consts::PI,
        )?;
        require_positive(CONTEXT, "projectile_speed", self.projectile_speed)?;
        require_non_negative(CONTEXT, "projectile_damage", self.projectile_damage)?;
        Ok(())
    }
}

/// Lays `overrides` over `base`, descending into objects so a partial nested
/// table keeps the built-in values of every field it leaves out.
fn overlay_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => overlay_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn parse_error(path: &'static str) -> impl FnOnce(serde_json::Error) -> TuningError {
    move |source| TuningError::Parse {
        path: path.to_owned(),
        source,
    }
}

pub(crate) fn parse_tuning_json(raw: &str) -> Result<TuningTable, TuningError> {
    let overrides: Value = serde_json::from_str(raw).map_err(parse_error("."))?;
    let mut merged = serde_json::to_value(TuningTable::default()).map_err(parse_error("."))?;
    overlay_json(&mut merged, overrides);

    let table = serde_path_to_error::deserialize::<_, TuningTable>(merged).map_err(|error| {
        let path = error.path().to_string();
        TuningError::Parse {
            path,
            source: error.into_inner(),
        }
    })?;
    table.validate()?;
    Ok(table)
}

pub(crate) fn load_tuning_file(path: &Path) -> Result<TuningTable, TuningError> {
    let raw = fs::read_to_string(path).map_err(|source| TuningError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tuning_json(&raw)
}
