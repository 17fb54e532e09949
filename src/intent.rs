//! Movement and look intent components.
//!
//! Intents represent the desired movement from player input or AI. The
//! crate never reads devices itself: your code samples keyboard/mouse (or
//! gamepad, or an AI policy) and writes the result here each tick, and the
//! controller systems turn it into physics.

use bevy::prelude::*;

/// Per-tick movement input snapshot.
///
/// Plain held-key booleans, classic FPS scheme: four planar
/// directions plus jump. Jump is level-triggered, not edge-triggered — a
/// held jump key re-fires on every grounded tick, which is part of the
/// classic feel (bunny-hop friendly).
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use quake_character_controller::prelude::*;
///
/// let mut intent = MoveIntent::default();
/// intent.forward = true;
/// intent.right = true;
///
/// // Diagonal input still yields a wish velocity of full speed
/// let wish = intent.wish_velocity(Vec3::NEG_Z, Vec3::X, 40.0);
/// assert!((wish.length() - 40.0).abs() < 1e-3);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct MoveIntent {
    /// Move along the body's forward axis.
    pub forward: bool,
    /// Move against the body's forward axis.
    pub back: bool,
    /// Move against the body's right axis.
    pub left: bool,
    /// Move along the body's right axis.
    pub right: bool,
    /// Jump key held.
    pub jump: bool,
}

impl MoveIntent {
    /// Clear all inputs.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether any planar movement key is held.
    pub fn is_moving(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// The world-space velocity the input alone implies, before any
    /// physics interaction.
    ///
    /// Sums the held directions, normalizes (a zero or self-cancelling
    /// input stays zero — never NaN), and scales to `speed`. Pure.
    pub fn wish_velocity(&self, body_forward: Vec3, body_right: Vec3, speed: f32) -> Vec3 {
        let mut wish = Vec3::ZERO;

        if self.forward {
            wish += body_forward;
        }
        if self.back {
            wish -= body_forward;
        }
        if self.left {
            wish -= body_right;
        }
        if self.right {
            wish += body_right;
        }

        wish.normalize_or_zero() * speed
    }
}

/// Accumulated mouse delta, consumed by the look system once per render
/// tick.
///
/// Feed raw motion events into [`LookInput::accumulate`]; the look system
/// drains the buffer with [`LookInput::take`] so deltas are never applied
/// twice.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LookInput {
    /// Pending mouse delta (x = horizontal, y = vertical).
    pub delta: Vec2,
}

impl LookInput {
    /// Add a mouse motion delta to the pending buffer.
    pub fn accumulate(&mut self, delta: Vec2) {
        self.delta += delta;
    }

    /// Take the pending delta, leaving zero behind.
    pub fn take(&mut self) -> Vec2 {
        std::mem::take(&mut self.delta)
    }
}
