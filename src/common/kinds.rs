//! Weapon and ammunition identifiers.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmmoType {
    Hand,
    Pistol,
    DualPistol,
    Sniper,
}

impl AmmoType {
    pub const ALL: [AmmoType; 4] = [
        AmmoType::Hand,
        AmmoType::Pistol,
        AmmoType::DualPistol,
        AmmoType::Sniper,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    Hand,
    Pistol,
    DualPistol,
    Sniper,
}

impl WeaponType {
    pub const ALL: [WeaponType; 4] = [
        WeaponType::Hand,
        WeaponType::Pistol,
        WeaponType::DualPistol,
        WeaponType::Sniper,
    ];

    /// Ammunition fired by this weapon.
    pub fn ammo(self) -> AmmoType {
        match self {
            WeaponType::Hand => AmmoType::Hand,
            WeaponType::Pistol => AmmoType::Pistol,
            WeaponType::DualPistol => AmmoType::DualPistol,
            WeaponType::Sniper => AmmoType::Sniper,
        }
    }
}
