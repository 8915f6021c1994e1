//! Weapon inventory and the equipped ammunition it implies.

use bevy::prelude::*;

use crate::common::kinds::{AmmoType, WeaponType};
use crate::common::tunables::ArsenalTunables;

#[derive(Component, Debug, Clone)]
pub struct Arsenal {
    weapons: Vec<WeaponType>,
    equipped: WeaponType,
}

/// Ammunition the actor fires. Kept in sync with `Arsenal` through `WeaponChanged`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquippedAmmo(pub AmmoType);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EquipOutcome {
    Changed { from: WeaponType, to: WeaponType },
    AlreadyEquipped,
    EmptyArsenal,
    NotOwned,
}

impl Arsenal {
    pub fn new(weapons: Vec<WeaponType>, equipped: WeaponType) -> Self {
        Self { weapons, equipped }
    }

    pub fn from_tunables(t: &ArsenalTunables) -> Self {
        Self::new(t.weapons.clone(), t.equipped)
    }

    pub fn equipped(&self) -> WeaponType {
        self.equipped
    }

    pub fn weapons(&self) -> &[WeaponType] {
        &self.weapons
    }

    pub fn equip(&mut self, weapon: WeaponType) -> EquipOutcome {
        if self.weapons.is_empty() {
            return EquipOutcome::EmptyArsenal;
        }
        if !self.weapons.contains(&weapon) {
            return EquipOutcome::NotOwned;
        }
        if self.equipped == weapon {
            return EquipOutcome::AlreadyEquipped;
        }

        let from = self.equipped;
        self.equipped = weapon;
        EquipOutcome::Changed { from, to: weapon }
    }
}

/// Request to equip `weapon` on `actor`.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetArsenal {
    pub actor: Entity,
    pub weapon: WeaponType,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeaponChanged {
    pub actor: Entity,
    pub weapon: WeaponType,
}

pub(crate) fn apply_set_arsenal(
    mut requests: MessageReader<SetArsenal>,
    mut q: Query<&mut Arsenal>,
    mut changed: MessageWriter<WeaponChanged>,
) {
    for req in requests.read() {
        let Ok(mut arsenal) = q.get_mut(req.actor) else {
            warn!("SetArsenal for {:?} which has no arsenal", req.actor);
            continue;
        };

        match arsenal.equip(req.weapon) {
            EquipOutcome::Changed { from, to } => {
                debug!("{:?} switched weapon {from:?} -> {to:?}", req.actor);
                changed.write(WeaponChanged {
                    actor: req.actor,
                    weapon: to,
                });
            }
            EquipOutcome::AlreadyEquipped => {}
            EquipOutcome::EmptyArsenal => {
                error!("arsenal of {:?} is empty; cannot equip {:?}", req.actor, req.weapon);
            }
            EquipOutcome::NotOwned => {
                warn!("{:?} does not own {:?}", req.actor, req.weapon);
            }
        }
    }
}

pub(crate) fn sync_equipped_ammo(
    mut changes: MessageReader<WeaponChanged>,
    mut q: Query<&mut EquippedAmmo>,
) {
    for change in changes.read() {
        if let Ok(mut ammo) = q.get_mut(change.actor) {
            ammo.0 = change.weapon.ammo();
        }
    }
}
