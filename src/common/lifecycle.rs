//! Deferred removal of gameplay entities.
//!
//! Entities are never despawned inside the fixed step. Gameplay code marks them
//! with `PendingDespawn` (which every gameplay query filters out) and a single
//! `PostUpdate` system does the structural work.

use bevy::prelude::*;

/// Marker: entity is dead to gameplay and will be removed at the end of the frame.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// Despawn everything marked for removal.
pub fn despawn_marked(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
