//! Collision layers.
//!
//! These double as the collision categories the physics collaborator tags
//! overlap events with (enemy, attack zone, exit, hazard).

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Player,
    Enemy,
    AttackZone,
    Exit,
    Hazard,
}
