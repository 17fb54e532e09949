//! Mouse look.
//!
//! A simple Quake-style look controller working in accumulated Euler
//! angles (degrees). It runs on the render tick, independent of the fixed
//! physics tick, and feeds two explicit output channels:
//!
//! - the body transform receives a **yaw-only** rotation, so the physics
//!   capsule never pitches or rolls with the view;
//! - a [`CameraAngles`] component receives the full (pitch, yaw, roll)
//!   triple for whatever renders the first-person view.
//!
//! Angle conventions follow the screen: positive yaw turns right, positive
//! pitch looks down. Pitch is intentionally unclamped — wrapping past ±90°
//! flips the view, and that is the intended feel; do not add a clamp here.

use bevy::prelude::*;

use crate::intent::LookInput;

/// Accumulated look angles plus mouse sensitivity.
///
/// Mutated only by [`update_look`]; everything else treats it as
/// read-only.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct LookController {
    /// Accumulated pitch in degrees; positive looks down. Unclamped.
    pub pitch: f32,
    /// Accumulated yaw in degrees; positive turns right.
    pub yaw: f32,
    /// Roll in degrees. Never written by the look system, present for the
    /// camera channel.
    pub roll: f32,
    /// Degrees of rotation per unit of mouse delta.
    pub sensitivity: f32,
}

impl Default for LookController {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            sensitivity: 1.0,
        }
    }
}

impl LookController {
    /// Create a controller with the given sensitivity.
    pub fn with_sensitivity(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            ..default()
        }
    }

    /// Accumulate a mouse delta into the stored angles.
    pub fn apply_delta(&mut self, delta: Vec2) {
        self.pitch -= delta.y * self.sensitivity;
        self.yaw += delta.x * self.sensitivity;
    }

    /// Body rotation: yaw only, about world up.
    pub fn body_rotation(&self) -> Quat {
        // Positive yaw turns right, which is a negative rotation about +Y.
        Quat::from_rotation_y(-self.yaw.to_radians())
    }
}

/// Full view orientation, the camera-sink output channel.
///
/// Written by [`update_look`] on the body entity; [`sync_look_camera`]
/// forwards it to child cameras. Angles are degrees, same conventions as
/// [`LookController`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct CameraAngles {
    /// View pitch; positive looks down.
    pub pitch: f32,
    /// View yaw; positive turns right.
    pub yaw: f32,
    /// View roll.
    pub roll: f32,
}

/// Marker for a first-person camera entity parented to a character body.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct LookCamera {
    /// Camera offset from the body origin (eye height).
    pub eye_offset: Vec3,
}

impl Default for LookCamera {
    fn default() -> Self {
        Self {
            eye_offset: Vec3::new(0.0, 0.75, 0.0),
        }
    }
}

/// Drain pending mouse deltas, accumulate the look angles, rotate the body
/// (yaw only) and publish the full angles to [`CameraAngles`].
pub fn update_look(
    mut q_look: Query<(
        &mut LookController,
        &mut LookInput,
        &mut Transform,
        Option<&mut CameraAngles>,
    )>,
) {
    for (mut controller, mut input, mut transform, angles) in &mut q_look {
        let delta = input.take();
        controller.apply_delta(delta);

        transform.rotation = controller.body_rotation();

        if let Some(mut angles) = angles {
            angles.pitch = controller.pitch;
            angles.yaw = controller.yaw;
            angles.roll = controller.roll;
        }
    }
}

/// Forward [`CameraAngles`] to child [`LookCamera`] entities.
///
/// The parent body already carries the yaw, so the camera's local rotation
/// only needs pitch and roll; the composed world rotation matches the full
/// (pitch, yaw, roll) triple.
pub fn sync_look_camera(
    q_bodies: Query<&CameraAngles>,
    mut q_cameras: Query<(&LookCamera, &ChildOf, &mut Transform)>,
) {
    for (camera, child_of, mut transform) in &mut q_cameras {
        let Ok(angles) = q_bodies.get(child_of.parent()) else {
            continue;
        };

        transform.translation = camera.eye_offset;
        // Positive pitch looks down: negative rotation about +X.
        transform.rotation = Quat::from_rotation_x(-angles.pitch.to_radians())
            * Quat::from_rotation_z(angles.roll.to_radians());
    }
}
