//! State marker components.
//!
//! These components indicate the current movement regime of a character.
//! They are added/removed by `sync_state_markers` from the controller's
//! ground detection results, so consumer systems can query for grounded or
//! airborne characters without reading the controller itself.
//!
//! The regime is recomputed from scratch every physics tick; there is no
//! hysteresis. Stepping off a ledge flips a character to [`Airborne`] on
//! the very next tick.

use bevy::prelude::*;

/// Marker component indicating the character stands on walkable ground.
///
/// Mutually exclusive with [`Airborne`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character has no ground contact.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;
