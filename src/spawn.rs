//! Spawn point registry.
//!
//! Game modes use the registry to pick where to place a player. Levels
//! mark candidate locations with a [`SpawnPoint`] component; a collection
//! system records them into the [`SpawnRegistry`] resource, and session
//! code asks for one at random.
//!
//! The registry is an owned, injectable resource with an explicit
//! lifecycle — construct (or [`clear`](SpawnRegistry::clear)) at session
//! start, pick at player spawn — rather than process-wide shared state.

use bevy::prelude::*;
use rand::Rng;

/// Marker for a location where a player may spawn.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct SpawnPoint;

/// A registered spawn location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnLocation {
    /// The entity carrying the [`SpawnPoint`] marker.
    pub entity: Entity,
    /// World position of the spawn.
    pub position: Vec3,
    /// Facing of the spawn.
    pub rotation: Quat,
}

/// Registry of available spawn locations.
#[derive(Resource, Debug, Default)]
pub struct SpawnRegistry {
    spawns: Vec<SpawnLocation>,
}

impl SpawnRegistry {
    /// Register a spawn location. Registering the same entity twice is a
    /// no-op, so re-activated markers don't duplicate themselves.
    pub fn register(&mut self, location: SpawnLocation) {
        if self.spawns.iter().any(|s| s.entity == location.entity) {
            return;
        }
        self.spawns.push(location);
    }

    /// Remove all registered spawns. Call at session reset.
    pub fn clear(&mut self) {
        self.spawns.clear();
    }

    /// Number of registered spawns.
    pub fn len(&self) -> usize {
        self.spawns.len()
    }

    /// Whether the registry holds no spawns.
    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
    }

    /// Pick a spawn uniformly at random.
    ///
    /// Returns `None` when the registry is empty. That is "no spawn
    /// available", not an error — session code decides what to do about
    /// it (typically: don't instantiate a player).
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&SpawnLocation> {
        if self.spawns.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.spawns.len());
        self.spawns.get(index)
    }
}

/// Record newly added [`SpawnPoint`] markers into the registry.
pub fn register_spawn_points(
    mut registry: ResMut<SpawnRegistry>,
    q_added: Query<(Entity, &GlobalTransform), Added<SpawnPoint>>,
) {
    for (entity, transform) in &q_added {
        let (_, rotation, position) = transform.to_scale_rotation_translation();
        registry.register(SpawnLocation {
            entity,
            position,
            rotation,
        });
    }
}
