//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::CollisionData;
use crate::config::{CharacterController, ControllerConfig};
use crate::detection::{probe_origin, resolve_ground};
use crate::CharacterControllerSet;

/// Body mass the default feel constants were tuned against. Give character
/// colliders this mass (see [`Fps3dCharacterBundle`]) or re-tune the
/// impulse-based config values.
pub const REFERENCE_BODY_MASS: f32 = 50.0;

/// Rapier3D physics backend for the character controller.
///
/// Uses `bevy_rapier3d` for force application and velocity manipulation.
/// Ground sensing (ray + sphere casts) runs in a dedicated Rapier system
/// that receives the query pipeline as a system parameter.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_acceleration(world: &mut World, entity: Entity, acceleration: Vec3) {
        // Rapier works in forces; scale by mass so the same config values
        // accelerate any body identically. Mass write-back lags one tick
        // after spawn, so fall back to unit mass until it arrives.
        let mass = world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|mass| *mass > 0.0)
            .unwrap_or(1.0);

        // Accumulated into the controller, not written to ExternalForce
        // directly: apply_controller_forces flushes at the end of the tick
        // and clear_controller_forces undoes it next tick, keeping any
        // user-applied external forces intact.
        if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
            controller.add_force(acceleration * mass);
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
            return;
        }

        // Fallback without ExternalImpulse: write the velocity change
        // directly. Impulse is a momentum change, so it scales with the
        // inverse of the body's mass.
        let mass = world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|mass| *mass > 0.0)
            .unwrap_or(1.0);

        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel += impulse / mass;
        }
    }

    fn set_linear_damping(world: &mut World, entity: Entity, damping: f32) {
        if let Some(mut d) = world.get_mut::<Damping>(entity) {
            d.linear_damping = damping;
        }
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.to_scale_rotation_translation().1)
            })
            .unwrap_or(Quat::IDENTITY)
    }
}

/// Plugin that sets up Rapier3D-specific systems for the character
/// controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        // When the Rapier step runs in the fixed schedule, the whole
        // controller pipeline must finish before the backend sync picks
        // the forces up.
        app.configure_sets(
            FixedUpdate,
            CharacterControllerSet::FinalApplication.before(PhysicsSet::SyncBackend),
        );

        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(CharacterControllerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            rapier_ground_detection.in_set(CharacterControllerSet::Sensors),
        );
        app.add_systems(
            FixedUpdate,
            apply_controller_forces.in_set(CharacterControllerSet::FinalApplication),
        );
    }
}

/// Ground sensor: the two-stage ray/sphere probe from the collider bottom.
///
/// The thin ray runs first; the sphere cast is only evaluated on a ray
/// miss, starting lifted above the bottom so its sweep overlaps the ray's
/// span (a ray can tunnel past collider edges the wide sphere still sees).
/// Both probes exclude the character's own rigid body and any sensors.
fn rapier_ground_detection(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        &mut CharacterController,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, mut controller) in &mut q_controllers {
        let (_, rotation, position) = transform.to_scale_rotation_translation();
        let up = rotation * Vec3::Y;
        let down = -up;
        let bottom = probe_origin(position, up, config);

        let filter = QueryFilter::default()
            .exclude_rigid_body(entity)
            .exclude_sensors();

        let ray_hit = context
            .cast_ray_and_get_normal(bottom, down, config.ray_probe_length, true, filter)
            .map(|(hit_entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
            });

        let sphere = Collider::ball(config.sphere_probe_radius);
        let sphere_hit = || {
            context
                .cast_shape(
                    bottom + up * config.sphere_probe_lift,
                    Quat::IDENTITY,
                    down,
                    &*sphere.raw,
                    ShapeCastOptions {
                        max_time_of_impact: config.sphere_probe_length,
                        stop_at_penetration: false,
                        ..default()
                    },
                    filter,
                )
                .map(|(hit_entity, hit)| {
                    let normal = hit.details.map(|d| d.normal1).unwrap_or(up);
                    let point = hit
                        .details
                        .map(|d| d.witness1)
                        .unwrap_or(bottom + down * hit.time_of_impact);
                    CollisionData::new(hit.time_of_impact, normal, point, Some(hit_entity))
                })
        };

        controller.reset_detection_state();
        let contact = resolve_ground(ray_hit, sphere_hit, up, config.slope_limit);
        controller.apply_contact(contact);
    }
}

/// Start-of-tick force isolation.
///
/// Subtracts the forces the controller applied last tick from
/// `ExternalForce`, restoring it to the external-only state before this
/// tick's forces accumulate.
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut CharacterController)>) {
    for (mut ext_force, mut controller) in &mut q {
        let to_subtract = controller.prepare_new_frame();
        ext_force.force -= to_subtract;
    }
}

/// End-of-tick force application.
///
/// Flushes the tick's accumulated controller forces into `ExternalForce`
/// so Rapier's physics step integrates them, remembering the amount for
/// next tick's subtraction.
pub fn apply_controller_forces(mut q: Query<(&mut ExternalForce, &mut CharacterController)>) {
    for (mut ext_force, mut controller) in &mut q {
        let to_apply = controller.finalize_frame();
        ext_force.force += to_apply;
    }
}

/// Bundle for creating a character body with Rapier3D physics.
///
/// Provides the physics components the controller drives: a dynamic rigid
/// body with rotation locked (the look system owns yaw; the capsule never
/// tips), zeroed Rapier gravity (the controller applies its own simplified
/// gravity), velocity/force/impulse accumulators and mass read-back.
///
/// Spawn it next to a capsule collider and the controller components:
///
/// ```ignore
/// commands.spawn((
///     Transform::from_xyz(0.0, 2.0, 0.0),
///     CharacterController::new(),
///     ControllerConfig::default(),
///     MoveIntent::default(),
///     Fps3dCharacterBundle::default(),
///     Collider::capsule_y(0.405, 0.5),
///     ColliderMassProperties::Mass(REFERENCE_BODY_MASS),
/// ));
/// ```
#[derive(Bundle)]
pub struct Fps3dCharacterBundle {
    /// The rigid body type. [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity, updated by Rapier each step.
    pub velocity: Velocity,
    /// Force accumulator the controller writes through force isolation.
    pub external_force: ExternalForce,
    /// Impulse accumulator, used for jumps and the ground stick.
    pub external_impulse: ExternalImpulse,
    /// Rotation locked: the body only ever yaws, via the look system.
    pub locked_axes: LockedAxes,
    /// Linear damping; the controller rewrites the coefficient every tick.
    pub damping: Damping,
    /// Mass read-back used to make accelerations mass-independent.
    pub mass_properties: ReadMassProperties,
    /// Rapier gravity disabled; the controller applies its own.
    pub gravity_scale: GravityScale,
}

impl Default for Fps3dCharacterBundle {
    fn default() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 1.0,
                angular_damping: 0.0,
            },
            mass_properties: ReadMassProperties::default(),
            gravity_scale: GravityScale(0.0),
        }
    }
}

impl Fps3dCharacterBundle {
    /// Create the default character bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rigid body type.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes are locked.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
