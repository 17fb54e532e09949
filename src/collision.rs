//! Hit record shared by the ground probes.
//!
//! The thin ray and the fallback sphere cast both reduce their engine
//! results to the same [`CollisionData`] record, so the ground resolution
//! logic never needs to know which probe produced a hit.

use bevy::prelude::*;

/// A single probe hit against world geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionData {
    /// Travel distance from the probe origin to the hit. For the ground
    /// probes this is the stick distance candidate.
    pub distance: f32,
    /// Surface normal at the hit point, fed to the slope test.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit, if the engine reported one.
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a hit record.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}
