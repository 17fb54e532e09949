//! Ground detection.
//!
//! The ground sensor runs two short-range probes from the collider bottom:
//! a thin ray first, then a wide sphere as a fallback. The ray is cheap and
//! precise on stairs and ledge lips; the sphere catches geometry the ray
//! can tunnel past at collider edges. Both probes reject surfaces steeper
//! than the slope limit.
//!
//! Probe execution is backend-specific (see the `rapier` module); the
//! resolution logic here is pure so it can be tested without a physics
//! world. The sphere probe is passed lazily and is only evaluated when the
//! ray misses.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::ControllerConfig;

/// Result of a ground detection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundContact {
    /// Whether walkable ground was found.
    pub on_ground: bool,
    /// Normal of whatever surface the winning probe hit; zero when both
    /// probes missed. Recorded even for steep (rejected) hits, so it is
    /// only meaningful together with `on_ground`.
    pub normal: Vec3,
    /// Distance from the probe origin to the hit surface; zero on miss.
    pub stick: f32,
    /// Entity the winning probe hit.
    pub entity: Option<Entity>,
}

impl GroundContact {
    /// Contact representing "nothing underfoot".
    pub fn airborne() -> Self {
        Self::default()
    }
}

/// Origin of the downward probes: the lowest point of the collider.
#[inline]
pub fn probe_origin(position: Vec3, body_up: Vec3, config: &ControllerConfig) -> Vec3 {
    position - body_up * config.collider_half_height
}

/// Combine the two probe results into a ground contact.
///
/// The ray result wins whenever it hit; the sphere closure is evaluated
/// only on a ray miss. Steepness is tested as `|dot(normal, up)| <
/// slope_limit`, but against a different up per branch: the ray branch
/// uses *world* up, the sphere branch uses *body* up. The asymmetry is
/// part of the reference tuning and kept on purpose; with the
/// body's rotation locked to yaw the two coincide anyway.
pub fn resolve_ground(
    ray_hit: Option<CollisionData>,
    sphere_hit: impl FnOnce() -> Option<CollisionData>,
    body_up: Vec3,
    slope_limit: f32,
) -> GroundContact {
    if let Some(hit) = ray_hit {
        return GroundContact {
            on_ground: hit.normal.dot(Vec3::Y).abs() >= slope_limit,
            normal: hit.normal,
            stick: hit.distance,
            entity: hit.entity,
        };
    }

    match sphere_hit() {
        Some(hit) => GroundContact {
            on_ground: hit.normal.dot(body_up).abs() >= slope_limit,
            normal: hit.normal,
            stick: hit.distance,
            entity: hit.entity,
        },
        None => GroundContact::airborne(),
    }
}
