//! Core plugin: shared resources, global settings and frame-end cleanup.

use bevy::prelude::*;

use crate::common::facing::sync_facing_sprites;
use crate::common::lifecycle::despawn_marked;
use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    app.insert_resource(Tunables::default());
    app.insert_resource(ClearColor(Color::srgb(0.08, 0.05, 0.1)));

    app.add_systems(Update, sync_facing_sprites);
    // Structural cleanup once the fixed steps of the frame are done.
    app.add_systems(PostUpdate, despawn_marked);
}
