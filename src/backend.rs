//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the character controller. This allows easy swapping
//! between physics engines (Rapier3D, XPBD, custom, etc.).

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the character
/// controller. The backend handles velocity manipulation and force
/// application; ground sensing runs in backend-specific systems registered
/// by [`CharacterPhysicsBackend::plugin`].
///
/// Two force modes are distinguished, mirroring the classic rigid-body API:
///
/// - **Acceleration** ([`apply_acceleration`](Self::apply_acceleration)):
///   mass-independent, integrated over the physics timestep. A backend
///   working in forces must scale by the body's mass so that the same
///   config values produce the same movement regardless of mass.
/// - **Impulse** ([`apply_impulse`](Self::apply_impulse)): an instantaneous
///   momentum change; the resulting velocity change is `impulse / mass`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    ///
    /// The plugin must register the backend's ground sensor system in
    /// [`CharacterControllerSet::Sensors`](crate::CharacterControllerSet)
    /// and whatever force bookkeeping it needs in the `Preparation` and
    /// `FinalApplication` sets.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    ///
    /// This is a hard overwrite; the controller only uses it for the
    /// grounded velocity clip.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Apply a mass-independent acceleration to an entity (units/s²),
    /// accumulated until the next physics step.
    fn apply_acceleration(world: &mut World, entity: Entity, acceleration: Vec3);

    /// Apply an impulse to an entity.
    ///
    /// Impulse is an instantaneous change in momentum; the velocity change
    /// scales with the inverse of the body's mass.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Set the linear damping ("drag") coefficient of an entity.
    fn set_linear_damping(world: &mut World, entity: Entity, damping: f32);

    /// Get the current rotation of an entity.
    ///
    /// The controller derives the body's forward/right/up axes from this.
    fn get_rotation(world: &World, entity: Entity) -> Quat;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
