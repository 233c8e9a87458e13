//! Combat plugin: the player's limited ranged attack and everything that hits.
//!
//! # Data flow
//! ```text
//!   FixedUpdate (after the continuation clock)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  apply_attack_intents     Intent::{BeginAttack, EndAttack}                 │
//!│                           -> CombatController, PlayerPose, effect sprite   │
//!│                           -> schedule Recharge                             │
//!│  finish_recharge          ContinuationDue(Recharge) -> charge Full         │
//!│  end_flicker              ContinuationDue(EndFlicker) -> vulnerable again  │
//!│  animate_flicker          Flicker -> sprite alpha                          │
//!│  zone_follows_owner       Facing -> zone / effect offsets                  │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedPostUpdate (after avian's CollisionEventSystems), strictly in order
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  track_zone_overlaps      CollisionStart/End(zone, enemy) -> Shootable     │
//!│  resolve_zone_kills       live attack && Shootable -> EnemyDestroyed       │
//!│  resolve_body_contacts    CollisionStart(player, enemy | hazard)           │
//!│                           -> destroy / ignore / hurt + flicker / die       │
//!│  check_fall_out_of_world  below the fall limit -> die, restart level       │
//!└────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Overlap flags are written before the kill check reads them in the same tick,
//! and every destroyed entity is tagged `PendingDespawn` before the next system
//! in the chain runs, so nothing is resolved twice.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::plugins::level::ActiveLevel;
use crate::plugins::player;
use crate::plugins::scheduler::advance_continuations;

pub mod components;
pub mod controller;
pub mod hits;

pub use components::{AttackCharge, AttackEffect, AttackZone, CombatController, Flicker};

/// Time from the end of an attack until the charge is back.
pub const RECHARGE_SECS: f32 = 1.0;
/// Length of one opacity ramp of the hit flicker.
pub const FLICKER_RAMP_SECS: f32 = 0.05;
/// Whole invulnerability window: fade out, fade back in.
pub const FLICKER_SECS: f32 = FLICKER_RAMP_SECS * 2.0;

/// Attack zone offset from the player, facing right.
pub const ZONE_OFFSET: Vec2 = Vec2::new(42.0, -24.0);
pub const ZONE_SIZE: Vec2 = Vec2::new(60.0, 12.0);
/// Attack effect offset from the player, facing right.
pub const EFFECT_OFFSET: Vec2 = Vec2::new(60.0, 0.0);

/// What touching an enemy does while the attack is held but spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepletedContact {
    /// The enemy dies, the player is unharmed.
    #[default]
    DestroyEnemy,
    /// Only the attack zone kills; the contact hurts like any other.
    ZoneOnly,
}

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombatPolicy {
    pub depleted_contact: DepletedContact,
}

/// Player opacity `elapsed` seconds into the flicker: 1 -> 0 -> 1, linear.
pub fn flicker_opacity(elapsed: f32) -> f32 {
    let t = (elapsed / FLICKER_RAMP_SECS).clamp(0.0, 2.0);
    if t <= 1.0 { 1.0 - t } else { t - 1.0 }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<CombatPolicy>()
        .add_systems(
            OnEnter(GameState::InGame),
            controller::attach_attack_rig
                .after(player::spawn)
                .run_if(resource_exists::<ActiveLevel>),
        )
        .add_systems(
            FixedUpdate,
            (
                controller::apply_attack_intents,
                controller::finish_recharge,
                (hits::end_flicker, hits::animate_flicker).chain(),
            )
                .after(advance_continuations)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedUpdate,
            controller::zone_follows_owner
                .after(player::apply_movement)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            (
                hits::track_zone_overlaps,
                hits::resolve_zone_kills,
                hits::resolve_body_contacts,
                hits::check_fall_out_of_world,
            )
                .chain()
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}
