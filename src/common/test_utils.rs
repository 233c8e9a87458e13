//! Test helpers.
//!
//! Systems are driven one at a time with `World::run_system_once` (via the
//! `RunSystemOnce` trait) instead of building a full schedule. Collision events
//! are injected as avian `CollisionStart` / `CollisionEnd` messages so tests never
//! depend on the physics pipeline producing contacts.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::ecs::message::Messages;
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// A `Time<Fixed>` whose last delta is `dt` seconds.
pub fn fixed_time_with_delta(dt: f32) -> Time<Fixed> {
    let mut t = Time::<Fixed>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}

/// Make sure the message buffer for `M` exists so readers/writers validate.
pub fn ensure_messages<M: Message>(world: &mut World) {
    if world.get_resource::<Messages<M>>().is_none() {
        world.init_resource::<Messages<M>>();
    }
}

/// Inject an overlap-begin between two colliders that are their own bodies.
pub fn write_collision_start(world: &mut World, a: Entity, b: Entity) {
    ensure_messages::<CollisionStart>(world);
    world.write_message(CollisionStart {
        collider1: a,
        collider2: b,
        body1: Some(a),
        body2: Some(b),
    });
}

/// Inject an overlap-end between two colliders that are their own bodies.
pub fn write_collision_end(world: &mut World, a: Entity, b: Entity) {
    ensure_messages::<CollisionEnd>(world);
    world.write_message(CollisionEnd {
        collider1: a,
        collider2: b,
        body1: Some(a),
        body2: Some(b),
    });
}

/// Drain every message of type `M` currently buffered.
pub fn drain_messages<M: Message>(world: &mut World) -> Vec<M> {
    world
        .resource_mut::<Messages<M>>()
        .drain()
        .collect()
}
