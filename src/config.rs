//! Controller configuration and state components.
//!
//! This module defines the tunable feel constants of the movement model and
//! the central [`CharacterController`] state hub mutated each physics tick.

use bevy::prelude::*;

/// Configuration parameters for the character controller.
///
/// These constants ARE the feel of the movement: acceleration response,
/// air control, ground stick, jump height. The defaults reproduce the
/// reference Quake-style tuning exactly; change them in matched groups
/// (e.g. `wish_speed` together with `friction_reference_speed`) or the
/// balance between input drive and friction shifts.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Movement ===
    /// Speed the player's input alone implies, before any physics
    /// interaction (units/second). The wish velocity has exactly this
    /// magnitude whenever any movement key is held.
    pub wish_speed: f32,

    /// Horizontal speed threshold above which the grounded velocity clip
    /// engages. Note the clip is a quadratic decay, not a hard clamp: a
    /// velocity of magnitude `d * ground_clip_speed` (d > 1) is scaled to
    /// magnitude `ground_clip_speed / d`, so outputs land *below* the
    /// threshold, further below the faster the input.
    pub ground_clip_speed: f32,

    /// Friction factor applied against the current velocity while grounded.
    pub friction: f32,

    /// Wish-speed divisor for friction suppression. Friction fades in as
    /// input fades out: full input (wish magnitude 40, reference 50) keeps
    /// 80% of friction suppressed, zero input applies it in full.
    pub friction_reference_speed: f32,

    /// Acceleration multiplier while airborne (ground multiplier is 1.0).
    pub air_control: f32,

    /// Fraction of the current velocity fed back as acceleration while
    /// airborne. This mild momentum amplification is the deliberate
    /// "floaty" air movement quirk; do not remove it.
    pub air_boost: f32,

    /// Linear damping written to the rigid body every tick.
    pub linear_drag: f32,

    // === Gravity & ground stick ===
    /// Gravity magnitude (units/s²), applied along world down scaled by
    /// `1 - dot(body_up, ground_normal)`. On perfectly flat ground the
    /// term vanishes entirely: a simplified stand-in for normal-force
    /// cancellation rather than true contact physics.
    pub gravity: f32,

    /// Impulse per unit of stick distance pulling the body onto the
    /// detected surface each tick.
    pub stick_strength: f32,

    // === Jump ===
    /// Jump impulse magnitude along body up. Tuned against the 50-unit
    /// reference body mass; an impulse of 305 on a 50-mass body yields a
    /// 6.1 units/s takeoff.
    pub jump_impulse: f32,

    // === Ground probes ===
    /// Distance from the collider center to its bottom. Default matches
    /// the reference capsule (height 1.81).
    pub collider_half_height: f32,

    /// Length of the primary downward ray cast from the collider bottom.
    pub ray_probe_length: f32,

    /// Radius of the fallback sphere cast. Slightly narrower than the
    /// reference capsule so the sphere does not snag on walls.
    pub sphere_probe_radius: f32,

    /// Travel distance of the fallback sphere cast.
    pub sphere_probe_length: f32,

    /// Height above the collider bottom where the fallback sphere starts,
    /// so its sweep overlaps the ray's span and catches geometry a thin
    /// ray can tunnel past at collider edges.
    pub sphere_probe_lift: f32,

    /// Minimum `|dot(normal, up)|` for a hit to count as ground. 0.5
    /// rejects slopes steeper than roughly 60°.
    pub slope_limit: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Movement
            wish_speed: 40.0,
            ground_clip_speed: 5.0,
            friction: 5.0,
            friction_reference_speed: 50.0,
            air_control: 0.1,
            air_boost: 0.2,
            linear_drag: 1.0,

            // Gravity & ground stick
            gravity: 9.81,
            stick_strength: 40.0,

            // Jump
            jump_impulse: 305.0,

            // Ground probes
            collider_half_height: 1.81 / 2.0,
            ray_probe_length: 0.05,
            sphere_probe_radius: 0.48,
            sphere_probe_length: 0.1,
            sphere_probe_lift: 0.55,
            slope_limit: 0.5,
        }
    }
}

impl ControllerConfig {
    /// Builder: set the wish speed.
    pub fn with_wish_speed(mut self, speed: f32) -> Self {
        self.wish_speed = speed;
        self
    }

    /// Builder: set the grounded clip threshold.
    pub fn with_ground_clip_speed(mut self, speed: f32) -> Self {
        self.ground_clip_speed = speed;
        self
    }

    /// Builder: set the jump impulse.
    pub fn with_jump_impulse(mut self, impulse: f32) -> Self {
        self.jump_impulse = impulse;
        self
    }

    /// Builder: set the collider half height the ground probes start from.
    pub fn with_collider_half_height(mut self, half_height: f32) -> Self {
        self.collider_half_height = half_height;
        self
    }

    /// Builder: set the air control and air boost factors.
    pub fn with_air_movement(mut self, air_control: f32, air_boost: f32) -> Self {
        self.air_control = air_control;
        self.air_boost = air_boost;
        self
    }
}

/// Core character controller state component.
///
/// This is the central hub mutated once per physics tick: the ground
/// sensor writes the contact state, the movement integrator reads it, and
/// the backend uses the force accumulators to isolate controller forces
/// from any external forces the user applies to the same body.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CharacterController {
    /// Whether the ground probes found walkable ground this tick.
    pub on_ground: bool,

    /// Surface normal of the detected ground. Unit length when a probe
    /// hit this tick, zero otherwise. Consumers must treat `on_ground`
    /// as authoritative; the normal alone does not imply walkable ground
    /// (steep hits still record their normal).
    pub ground_normal: Vec3,

    /// Distance from the probe origin to the detected surface,
    /// non-negative. Used to pull the body toward the ground each tick.
    /// Zero when nothing was hit.
    pub stick: f32,

    /// Entity the ground probe hit, if any.
    pub ground_entity: Option<Entity>,

    // Force isolation accumulators (managed by the backend).
    pub(crate) pending_force: Vec3,
    pub(crate) applied_force: Vec3,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            on_ground: false,
            ground_normal: Vec3::ZERO,
            stick: 0.0,
            ground_entity: None,
            pending_force: Vec3::ZERO,
            applied_force: Vec3::ZERO,
        }
    }
}

impl CharacterController {
    /// Create a new controller with default (airborne, zeroed) state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-tick contact state. Called by the ground sensor at
    /// the start of each detection pass.
    pub(crate) fn reset_detection_state(&mut self) {
        self.on_ground = false;
        self.ground_normal = Vec3::ZERO;
        self.stick = 0.0;
        self.ground_entity = None;
    }

    /// Store the result of a ground detection pass.
    pub(crate) fn apply_contact(&mut self, contact: crate::detection::GroundContact) {
        self.on_ground = contact.on_ground;
        self.ground_normal = contact.normal;
        self.stick = contact.stick;
        self.ground_entity = contact.entity;
    }

    /// Accumulate a force to be applied by the backend this tick.
    pub(crate) fn add_force(&mut self, force: Vec3) {
        self.pending_force += force;
    }

    /// Start a new tick: returns the force applied last tick so the
    /// backend can subtract it from the engine's accumulator, restoring
    /// the external-only state.
    pub(crate) fn prepare_new_frame(&mut self) -> Vec3 {
        let applied = self.applied_force;
        self.applied_force = Vec3::ZERO;
        self.pending_force = Vec3::ZERO;
        applied
    }

    /// Finish a tick: returns the accumulated force to hand to the engine
    /// and remembers it for next tick's subtraction.
    pub(crate) fn finalize_frame(&mut self) -> Vec3 {
        let pending = self.pending_force;
        self.applied_force = pending;
        self.pending_force = Vec3::ZERO;
        pending
    }
}
