//! Core controller systems.
//!
//! `apply_movement_forces` is the heart of the crate: the per-tick force
//! recipe that produces the Quake-like locomotion — wish-velocity drive,
//! friction, simplified gravity, ground stick, air boost and the grounded
//! velocity clip. The systems are generic over the physics backend.
//!
//! All forces for a tick are accumulated before the physics step resolves,
//! so the application order inside a tick carries no physical meaning; the
//! one ordering that matters is that ground detection (the backend's
//! sensor system) has already run.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::{CharacterController, ControllerConfig};
use crate::intent::MoveIntent;
use crate::state::{Airborne, Grounded};

/// Soften a velocity that exceeds `max_speed`.
///
/// Identity for zero velocity and for `|v| <= max_speed`. Above the
/// threshold the velocity is divided by `d²` where `d = |v| / max_speed`,
/// which lands the output at magnitude `max_speed / d` — *below* the
/// threshold, and further below the faster the input. This quadratic decay
/// is deliberately not a hard clamp; reproduce it exactly when porting.
pub fn clip_velocity(velocity: Vec3, max_speed: f32) -> Vec3 {
    let speed = velocity.length();
    if speed == 0.0 {
        return velocity;
    }

    let d = speed / max_speed;
    if d > 1.0 {
        velocity / (d * d)
    } else {
        velocity
    }
}

/// Remove the component of `vector` along `normal`, so the result lies in
/// the plane the normal defines.
///
/// A zero (or near-zero) normal returns the vector unchanged, which is what
/// the airborne path relies on when no probe recorded a surface.
pub fn project_onto_plane(vector: Vec3, normal: Vec3) -> Vec3 {
    let sqr_len = normal.length_squared();
    if sqr_len < f32::EPSILON {
        return vector;
    }

    vector - normal * (vector.dot(normal) / sqr_len)
}

/// Apply the per-tick movement forces to every character body.
///
/// Reads the ground contact computed by the backend's sensor system this
/// tick and mutates the rigid body through the backend: three acceleration
/// forces (drive, friction, gravity), one stick impulse, the drag write,
/// and — depending on regime — either the airborne momentum boost or the
/// grounded velocity clip. This is the principal side-effecting operation
/// of the whole crate.
pub fn apply_movement_forces<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig, MoveIntent, CharacterController)> = world
        .query::<(Entity, &ControllerConfig, &MoveIntent, &CharacterController)>()
        .iter(world)
        .map(|(e, config, intent, controller)| (e, *config, *intent, *controller))
        .collect();

    for (entity, config, intent, controller) in entities {
        let rotation = B::get_rotation(world, entity);
        let up = rotation * Vec3::Y;
        let forward = rotation * Vec3::NEG_Z;
        let right = rotation * Vec3::X;

        let wish = intent.wish_velocity(forward, right, config.wish_speed);
        let velocity = B::get_velocity(world, entity);

        let on_ground = controller.on_ground;
        let normal = controller.ground_normal;

        // Regime split: one general multiplier on the drive force, and the
        // ground-coupled terms (stick, gravity cancellation) disabled in
        // the air regardless of any normal a steep hit may have recorded.
        let mut multiplier = 1.0;
        let mut stick = controller.stick;
        let mut ground_dot = up.dot(normal);
        if !on_ground {
            multiplier = config.air_control;
            stick = 0.0;
            ground_dot = 0.0;
        }

        // The wish velocity is projected onto the ground plane so the
        // drive stays tangent to slopes. Adding the current velocity makes
        // this a target, not a delta: the force pushes proportionally to
        // where the body already is plus where the input wants it.
        let velocity_target = project_onto_plane(wish, normal) + velocity;

        // Friction opposes the current velocity but fades out under input:
        // full wish input suppresses most of it, zero input applies it in
        // full. Airborne, the scale is forced to 1 so no friction remains.
        let friction = -velocity * config.friction;
        let mut friction_scale = (wish.length() / config.friction_reference_speed).min(1.0);
        if !on_ground {
            friction_scale = 1.0;
        }

        B::set_linear_damping(world, entity, config.linear_drag);

        B::apply_acceleration(world, entity, velocity_target * multiplier);
        B::apply_acceleration(world, entity, friction * (1.0 - friction_scale));
        // Gravity vanishes on perfectly flat ground (ground_dot = 1): the
        // simplified stand-in for normal-force cancellation.
        B::apply_acceleration(world, entity, Vec3::Y * -config.gravity * (1.0 - ground_dot));
        // Pull toward the detected surface proportionally to the probe gap.
        B::apply_impulse(world, entity, -normal * (stick * config.stick_strength));

        if !on_ground {
            // Mild momentum amplification: the intentional "floaty" air
            // movement quirk.
            B::apply_acceleration(world, entity, velocity * config.air_boost);
        } else {
            // Hard velocity assignment happens only here.
            B::set_velocity(
                world,
                entity,
                clip_velocity(velocity, config.ground_clip_speed),
            );
        }
    }
}

/// Apply the jump impulse to grounded characters holding the jump key.
///
/// Airborne characters never receive the impulse, no matter how long the
/// key is held; a held key on the ground re-fires every tick.
pub fn apply_jump<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig)> = world
        .query::<(Entity, &ControllerConfig, &MoveIntent, &CharacterController)>()
        .iter(world)
        .filter(|(_, _, intent, controller)| intent.jump && controller.on_ground)
        .map(|(e, config, _, _)| (e, *config))
        .collect();

    for (entity, config) in entities {
        let up = B::get_rotation(world, entity) * Vec3::Y;
        B::apply_impulse(world, entity, up * config.jump_impulse);
    }
}

/// Sync [`Grounded`]/[`Airborne`] marker components from the controller's
/// detection results.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(Entity, &CharacterController, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, controller, has_grounded, has_airborne) in &q_controllers {
        if controller.on_ground {
            if !has_grounded {
                commands.entity(entity).insert(Grounded).remove::<Airborne>();
            }
        } else if !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }
    }
}
