//! Nearest visible hostile selection.

use avian2d::prelude::LayerMask;
use bevy::prelude::*;

use super::visibility::{SpatialOracle, is_visible};
use crate::common::layers::{hostile_mask, sight_mask};
use crate::common::tunables::TargetingTunables;

/// Facts about a candidate read from the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateProbe {
    pub position: Vec2,
    /// Center of the candidate's bounds; the line-of-sight ray aims here.
    pub bounds_center: Vec2,
    pub is_active: bool,
    pub is_dead: bool,
}

impl CandidateProbe {
    #[inline]
    pub fn is_engageable(&self) -> bool {
        self.is_active && !self.is_dead
    }
}

/// Target facts collaborator. `None` means the entity is gone or is not a hostile.
pub trait TargetRegistry {
    fn probe(&self, entity: Entity) -> Option<CandidateProbe>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetChange {
    Acquired(Entity),
    Lost(Entity),
}

/// Outcome of one tracker update. Holds at most one loss and one acquisition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TargetUpdate {
    pub lost: Option<Entity>,
    pub acquired: Option<Entity>,
}

impl TargetUpdate {
    pub fn is_empty(&self) -> bool {
        self.lost.is_none() && self.acquired.is_none()
    }

    /// Changes in delivery order: the loss always precedes the acquisition.
    pub fn changes(self) -> impl Iterator<Item = TargetChange> {
        self.lost
            .map(TargetChange::Lost)
            .into_iter()
            .chain(self.acquired.map(TargetChange::Acquired))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ScanSettings {
    pub search_radius: f32,
    pub update_interval: f32,
    pub eye_offset: Vec2,
    pub hostile_mask: LayerMask,
    pub sight_mask: LayerMask,
}

impl ScanSettings {
    pub fn from_tunables(t: &TargetingTunables) -> Self {
        Self {
            search_radius: t.search_radius,
            update_interval: t.update_interval,
            eye_offset: t.eye_offset(),
            hostile_mask: hostile_mask(),
            sight_mask: sight_mask(),
        }
    }
}

/// Current target of an actor, rescanned on a fixed interval.
#[derive(Component, Debug, Default, Clone)]
pub struct TargetTracker {
    current: Option<Entity>,
    next_scan_at: f32,
}

impl TargetTracker {
    pub fn current(&self) -> Option<Entity> {
        self.current
    }

    pub fn next_scan_at(&self) -> f32 {
        self.next_scan_at
    }

    /// Advance the tracker to `now`.
    ///
    /// Off-interval ticks only drop a held target that died, went inactive or vanished.
    pub fn update<S, R>(
        &mut self,
        now: f32,
        actor_position: Vec2,
        settings: &ScanSettings,
        oracle: &S,
        registry: &R,
    ) -> TargetUpdate
    where
        S: SpatialOracle + ?Sized,
        R: TargetRegistry + ?Sized,
    {
        if now < self.next_scan_at {
            return match self.current {
                Some(held) if !registry.probe(held).is_some_and(|p| p.is_engageable()) => {
                    self.retarget(None)
                }
                _ => TargetUpdate::default(),
            };
        }

        self.next_scan_at = now + settings.update_interval;
        let nearest = select_nearest(actor_position, settings, oracle, registry);
        self.retarget(nearest)
    }

    /// Drop the held target, if any.
    pub fn clear(&mut self) -> TargetUpdate {
        self.retarget(None)
    }

    fn retarget(&mut self, next: Option<Entity>) -> TargetUpdate {
        if next == self.current {
            return TargetUpdate::default();
        }
        let lost = self.current;
        self.current = next;
        TargetUpdate {
            lost,
            acquired: next,
        }
    }
}

/// Nearest live, active, visible hostile around `actor_position`.
///
/// Equal distances keep the candidate scanned first.
pub fn select_nearest<S, R>(
    actor_position: Vec2,
    settings: &ScanSettings,
    oracle: &S,
    registry: &R,
) -> Option<Entity>
where
    S: SpatialOracle + ?Sized,
    R: TargetRegistry + ?Sized,
{
    let eye = actor_position + settings.eye_offset;
    let mut best: Option<(Entity, f32)> = None;

    let candidates =
        oracle.overlap_circle(actor_position, settings.search_radius, settings.hostile_mask);
    for candidate in candidates {
        let Some(probe) = registry.probe(candidate) else {
            continue;
        };
        if !probe.is_engageable() {
            continue;
        }
        if !is_visible(oracle, eye, candidate, probe.bounds_center, settings.sight_mask) {
            continue;
        }

        let distance = actor_position.distance(probe.position);
        if best.is_none_or(|(_, nearest)| distance < nearest) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(entity, _)| entity)
}
