//! Tunable gameplay constants.
//!
//! Defaults are playable as-is. A JSON file with the same shape can override any subset
//! of fields; missing fields keep their default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::kinds::{AmmoType, WeaponType};

/// Tunables file loaded by the core plugin when present.
pub const TUNABLES_PATH: &str = "assets/tunables.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tunables from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tunables: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no ammo profile configured for {0:?}")]
    MissingAmmoProfile(AmmoType),
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("arsenal lists no weapons")]
    EmptyArsenal,
    #[error("equipped weapon {0:?} is not in the arsenal")]
    EquippedNotInArsenal(WeaponType),
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub movement: MovementTunables,
    pub targeting: TargetingTunables,
    pub attack: AttackTunables,
    pub enemies: EnemyTunables,
    pub ammo: HashMap<AmmoType, AmmoProfile>,
    pub arsenal: ArsenalTunables,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTunables {
    pub move_speed: f32,
    /// Seconds to ease the body toward a new movement heading.
    pub rotation_duration: f32,
    /// Squared input magnitude below which the actor counts as standing still.
    pub input_epsilon_sq: f32,
    /// Input magnitude at which the walk animation switches to run.
    pub walk_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingTunables {
    pub search_radius: f32,
    /// Seconds between nearest-target rescans.
    pub update_interval: f32,
    /// Offset from the actor position to the line-of-sight origin.
    pub eye_offset: [f32; 2],
    /// Aim rotation speed toward the held target, as a slerp factor per second.
    pub aim_turn_rate: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackTunables {
    pub attack_range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    pub aim_prepare_duration: f32,
    /// Offset added to the target position when computing the shot direction.
    pub aim_offset: [f32; 2],
    /// Distance from the fire origin to the muzzle along the shot direction.
    pub muzzle_distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTunables {
    pub max_hp: i32,
    pub detection_radius: f32,
    pub stop_distance: f32,
    pub stop_tolerance: f32,
    pub move_speed: f32,
    pub turn_rate: f32,
    pub despawn_delay: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoProfile {
    pub damage: i32,
    pub speed: f32,
    pub life_time: f32,
    pub radius: f32,
    pub color: [f32; 3],
    pub pool_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArsenalTunables {
    pub weapons: Vec<WeaponType>,
    pub equipped: WeaponType,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            movement: MovementTunables::default(),
            targeting: TargetingTunables::default(),
            attack: AttackTunables::default(),
            enemies: EnemyTunables::default(),
            ammo: default_ammo(),
            arsenal: ArsenalTunables::default(),
        }
    }
}

impl Default for MovementTunables {
    fn default() -> Self {
        Self {
            move_speed: 220.0,
            rotation_duration: 0.15,
            input_epsilon_sq: 0.001,
            walk_threshold: 0.4,
        }
    }
}

impl Default for TargetingTunables {
    fn default() -> Self {
        Self {
            search_radius: 420.0,
            update_interval: 0.2,
            eye_offset: [0.0, 0.0],
            aim_turn_rate: 10.0,
        }
    }
}

impl Default for AttackTunables {
    fn default() -> Self {
        Self {
            attack_range: 380.0,
            fire_rate: 4.0,
            aim_prepare_duration: 0.1,
            aim_offset: [0.0, 0.0],
            muzzle_distance: 18.0,
        }
    }
}

impl Default for EnemyTunables {
    fn default() -> Self {
        Self {
            max_hp: 30,
            detection_radius: 340.0,
            stop_distance: 40.0,
            stop_tolerance: 10.0,
            move_speed: 110.0,
            turn_rate: 5.0,
            despawn_delay: 2.0,
        }
    }
}

impl Default for ArsenalTunables {
    fn default() -> Self {
        Self {
            weapons: WeaponType::ALL.to_vec(),
            equipped: WeaponType::Pistol,
        }
    }
}

fn default_ammo() -> HashMap<AmmoType, AmmoProfile> {
    let profile = |damage, speed, radius, color, pool_size| AmmoProfile {
        damage,
        speed,
        life_time: 2.0,
        radius,
        color,
        pool_size,
    };

    HashMap::from([
        (AmmoType::Hand, profile(5, 600.0, 3.0, [0.85, 0.85, 0.85], 10)),
        (AmmoType::Pistol, profile(10, 900.0, 4.0, [1.0, 0.85, 0.3], 20)),
        (AmmoType::DualPistol, profile(8, 950.0, 3.5, [1.0, 0.6, 0.25], 30)),
        (AmmoType::Sniper, profile(30, 1600.0, 5.0, [0.55, 0.85, 1.0], 8)),
    ])
}

impl TargetingTunables {
    pub fn eye_offset(&self) -> Vec2 {
        Vec2::from_array(self.eye_offset)
    }
}

impl AttackTunables {
    pub fn aim_offset(&self) -> Vec2 {
        Vec2::from_array(self.aim_offset)
    }
}

impl Tunables {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tunables: Tunables = serde_json::from_str(json)?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load `path` if it exists; a missing file or an invalid one yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no tunables file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(tunables) => {
                info!("loaded tunables from {}", path.display());
                tunables
            }
            Err(err) => {
                error!("{err}; falling back to default tunables");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(missing) = AmmoType::ALL
            .into_iter()
            .find(|ammo| !self.ammo.contains_key(ammo))
        {
            return Err(ConfigError::MissingAmmoProfile(missing));
        }

        positive("pixels_per_meter", self.pixels_per_meter)?;
        positive("movement.move_speed", self.movement.move_speed)?;
        non_negative("movement.rotation_duration", self.movement.rotation_duration)?;
        positive("movement.input_epsilon_sq", self.movement.input_epsilon_sq)?;
        positive("targeting.search_radius", self.targeting.search_radius)?;
        non_negative("targeting.update_interval", self.targeting.update_interval)?;
        positive("attack.attack_range", self.attack.attack_range)?;
        positive("attack.fire_rate", self.attack.fire_rate)?;
        non_negative("attack.aim_prepare_duration", self.attack.aim_prepare_duration)?;
        non_negative("enemies.despawn_delay", self.enemies.despawn_delay)?;

        for profile in self.ammo.values() {
            positive("ammo.speed", profile.speed)?;
            positive("ammo.life_time", profile.life_time)?;
            positive("ammo.radius", profile.radius)?;
        }

        if self.arsenal.weapons.is_empty() {
            return Err(ConfigError::EmptyArsenal);
        }
        if !self.arsenal.weapons.contains(&self.arsenal.equipped) {
            return Err(ConfigError::EquippedNotInArsenal(self.arsenal.equipped));
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
