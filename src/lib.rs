//! # `quake_character_controller`
//!
//! A Quake-style first-person rigidbody character controller with physics
//! backend abstraction.
//!
//! This crate provides the classic arcade locomotion feel (walk, strafe,
//! jump, air control) on top of a dynamic rigid body:
//! - Two-stage ground detection: a cheap raycast with a spherecast
//!   fallback, plus slope rejection
//! - Wish-velocity movement driven by acceleration forces, with friction
//!   that fades under input
//! - Simplified gravity that cancels on flat ground, and a "stick" impulse
//!   that keeps the body glued to the surface
//! - A quadratic velocity clip while grounded and deliberately floaty air
//!   movement while not
//! - Mouse look split into two output channels: yaw-only body rotation and
//!   full pitch/yaw/roll camera angles
//! - Abstracted physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! The controller drives a **dynamic rigidbody** rather than a kinematic
//! mover:
//! 1. Short-range probes from the collider bottom classify the tick as
//!    grounded or airborne — recomputed from scratch every tick
//! 2. Player input becomes a wish velocity, projected onto the ground
//!    plane so movement follows slope contour
//! 3. Drive, friction and gravity are applied as mass-independent
//!    acceleration forces; ground stick and jumps as impulses
//! 4. The physics engine integrates the result; the controller only ever
//!    assigns velocity directly in the grounded clip step
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_rapier3d::prelude::*;
//! use quake_character_controller::prelude::*;
//!
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
//!     .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
//!     .run();
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod detection;
pub mod intent;
pub mod look;
pub mod spawn;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::config::{CharacterController, ControllerConfig};
    pub use crate::detection::GroundContact;
    pub use crate::intent::{LookInput, MoveIntent};
    pub use crate::look::{CameraAngles, LookCamera, LookController};
    pub use crate::spawn::{SpawnLocation, SpawnPoint, SpawnRegistry};
    pub use crate::state::{Airborne, Grounded};
    pub use crate::{CharacterControllerPlugin, CharacterControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Fps3dCharacterBundle, Rapier3dBackend, REFERENCE_BODY_MASS};
}

/// Ordered phases of the fixed-tick controller pipeline.
///
/// Backends hang their sensor and force-bookkeeping systems on
/// `Preparation`, `Sensors` and `FinalApplication`; the generic movement
/// systems run in `Movement`. The physics step itself must run after the
/// whole pipeline (schedule the physics plugin in the fixed schedule), so
/// ground detection always observes the state committed by the previous
/// step.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    /// Backend bookkeeping before anything reads physics state.
    Preparation,
    /// Ground detection probes.
    Sensors,
    /// Movement force computation, jumps, marker sync.
    Movement,
    /// Backend hands accumulated forces to the physics engine.
    FinalApplication,
}

/// Main plugin for the character controller system.
///
/// Generic over a physics backend `B` which provides the actual physics
/// operations (casting, force application, velocity manipulation).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g. `Rapier3dBackend`)
pub struct CharacterControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::CharacterController>();
        app.register_type::<intent::MoveIntent>();
        app.register_type::<intent::LookInput>();
        app.register_type::<look::LookController>();
        app.register_type::<look::CameraAngles>();
        app.register_type::<look::LookCamera>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<spawn::SpawnPoint>();

        app.init_resource::<spawn::SpawnRegistry>();

        app.configure_sets(
            FixedUpdate,
            (
                CharacterControllerSet::Preparation,
                CharacterControllerSet::Sensors,
                CharacterControllerSet::Movement,
                CharacterControllerSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin (sensors + force bookkeeping)
        app.add_plugins(B::plugin());

        // Core movement systems on the fixed tick
        app.add_systems(
            FixedUpdate,
            (
                systems::apply_movement_forces::<B>,
                systems::apply_jump::<B>,
                systems::sync_state_markers,
            )
                .chain()
                .in_set(CharacterControllerSet::Movement),
        );

        // Look runs on the render tick, in its own space
        app.add_systems(Update, (look::update_look, look::sync_look_camera).chain());

        app.add_systems(Update, spawn::register_spawn_points);
    }
}
