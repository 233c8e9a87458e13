//! Hit resolution: zone overlaps, zone kills, body contacts, hit flicker, falls.

use avian2d::prelude::*;
use bevy::ecs::query::QueryFilter;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::lifecycle::PendingDespawn;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{Enemy, EnemyDestroyed, KillCause, Shootable, destroy_enemy};
use crate::plugins::level::{ActiveLevel, GoToScene, Hazard};
use crate::plugins::player::{DeathCause, Health, MIN_HEALTH, Player, PlayerDied, PlayerHurt};
use crate::plugins::scheduler::{Continuation, ContinuationDue, Continuations};

use super::components::{AttackZone, CombatController, Flicker};
use super::{CombatPolicy, DepletedContact, FLICKER_SECS, flicker_opacity};

/// Outcome of the player touching an enemy or a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Spent attack still held: the enemy dies instead.
    DestroyEnemy,
    /// Invulnerable or already dead.
    Ignore,
    Hurt,
    Die,
}

/// Decide a single body contact. Hazards never take the kill path.
pub fn adjudicate(
    ctl: &CombatController,
    health: &Health,
    flicker: &Flicker,
    from_enemy: bool,
    policy: DepletedContact,
) -> ContactOutcome {
    if from_enemy && ctl.is_depleted_attack() && policy == DepletedContact::DestroyEnemy {
        return ContactOutcome::DestroyEnemy;
    }
    if health.is_dead() || flicker.active() {
        return ContactOutcome::Ignore;
    }
    if health.hp() <= MIN_HEALTH {
        ContactOutcome::Die
    } else {
        ContactOutcome::Hurt
    }
}

/// Of a colliding pair, the entity that is not matched by `q`.
#[inline]
fn other_side<F: QueryFilter>(q: &Query<(), F>, a: Entity, b: Entity) -> Option<Entity> {
    if q.contains(a) {
        Some(b)
    } else if q.contains(b) {
        Some(a)
    } else {
        None
    }
}

pub fn track_zone_overlaps(
    mut started: MessageReader<CollisionStart>,
    mut ended: MessageReader<CollisionEnd>,
    q_zone: Query<(), With<AttackZone>>,
    mut q_enemy: Query<&mut Shootable, (With<Enemy>, Without<PendingDespawn>)>,
) {
    for ev in started.read() {
        let Some(enemy) = other_side(&q_zone, ev.collider1, ev.collider2) else {
            continue;
        };
        if let Ok(mut shootable) = q_enemy.get_mut(enemy) {
            shootable.0 = true;
        }
    }

    for ev in ended.read() {
        let Some(enemy) = other_side(&q_zone, ev.collider1, ev.collider2) else {
            continue;
        };
        if let Ok(mut shootable) = q_enemy.get_mut(enemy) {
            shootable.0 = false;
        }
    }
}

/// While an attack is live, every shootable enemy dies. The first kill spends it.
pub fn resolve_zone_kills(
    mut commands: Commands,
    mut q_player: Query<&mut CombatController, (With<Player>, Without<PendingDespawn>)>,
    q_enemy: Query<(Entity, &Shootable), (With<Enemy>, Without<PendingDespawn>)>,
    mut destroyed: MessageWriter<EnemyDestroyed>,
) {
    for mut ctl in &mut q_player {
        if !ctl.can_zone_kill() {
            continue;
        }

        let mut kills = 0;
        for (enemy, _) in q_enemy.iter().filter(|(_, s)| s.0) {
            destroy_enemy(&mut commands, &mut destroyed, enemy, KillCause::Zone);
            kills += 1;
        }
        if kills > 0 {
            ctl.exhaust();
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn resolve_body_contacts(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    policy: Res<CombatPolicy>,
    level: Option<Res<ActiveLevel>>,
    mut continuations: ResMut<Continuations>,
    mut q_player: Query<
        (&mut CombatController, &mut Health, &mut Flicker),
        (With<Player>, Without<PendingDespawn>),
    >,
    q_enemy: Query<(), (With<Enemy>, Without<PendingDespawn>)>,
    q_hazard: Query<(), With<Hazard>>,
    mut destroyed: MessageWriter<EnemyDestroyed>,
    mut hurt: MessageWriter<PlayerHurt>,
    mut died: MessageWriter<PlayerDied>,
    mut scenes: MessageWriter<GoToScene>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (a, b) = (ev.collider1, ev.collider2);
        let (player, other) = if q_player.contains(a) {
            (a, b)
        } else if q_player.contains(b) {
            (b, a)
        } else {
            continue;
        };

        let from_enemy = q_enemy.contains(other);
        if !from_enemy && !q_hazard.contains(other) {
            continue;
        }
        // An enemy taken out earlier in this tick is not marked yet.
        if seen.contains(&other) {
            continue;
        }

        let Ok((mut ctl, mut health, mut flicker)) = q_player.get_mut(player) else {
            continue;
        };

        match adjudicate(&ctl, &health, &flicker, from_enemy, policy.depleted_contact) {
            ContactOutcome::DestroyEnemy => {
                seen.insert(other);
                ctl.spend_on_contact();
                destroy_enemy(&mut commands, &mut destroyed, other, KillCause::Contact);
            }
            ContactOutcome::Ignore => {
                trace!("contact with {other:?} ignored");
            }
            ContactOutcome::Hurt => {
                health.hurt();
                flicker.start();
                continuations.schedule(player, FLICKER_SECS, Continuation::EndFlicker);
                hurt.write(PlayerHurt { hp: health.hp() });
                debug!("Player hurt, hp = {}", health.hp());
            }
            ContactOutcome::Die => {
                health.hurt();
                let scene = level.as_ref().map(|l| l.failure_scene().to_string());
                kill_player(&mut commands, &mut died, &mut scenes, player, DeathCause::Combat, scene);
            }
        }
    }
}

/// Falling below the level restarts it.
pub fn check_fall_out_of_world(
    mut commands: Commands,
    tunables: Res<Tunables>,
    level: Option<Res<ActiveLevel>>,
    q_player: Query<(Entity, &Transform, &Health), (With<Player>, Without<PendingDespawn>)>,
    mut died: MessageWriter<PlayerDied>,
    mut scenes: MessageWriter<GoToScene>,
) {
    for (player, tf, health) in &q_player {
        if health.is_dead() || tf.translation.y >= tunables.fall_limit_y {
            continue;
        }
        let scene = level.as_ref().map(|l| l.name().to_string());
        kill_player(&mut commands, &mut died, &mut scenes, player, DeathCause::Fell, scene);
    }
}

fn kill_player(
    commands: &mut Commands,
    died: &mut MessageWriter<PlayerDied>,
    scenes: &mut MessageWriter<GoToScene>,
    player: Entity,
    cause: DeathCause,
    scene: Option<String>,
) {
    commands.entity(player).insert(PendingDespawn);
    died.write(PlayerDied { cause });
    match scene {
        Some(scene) => {
            info!("Player died ({cause:?}), going to '{scene}'");
            scenes.write(GoToScene { scene });
        }
        None => warn!("Player died ({cause:?}) outside a level"),
    }
}

pub fn end_flicker(
    mut due: MessageReader<ContinuationDue>,
    mut q: Query<(&mut Flicker, Option<&mut Sprite>), Without<PendingDespawn>>,
) {
    for c in due.read() {
        if c.continuation != Continuation::EndFlicker {
            continue;
        }
        let Ok((mut flicker, sprite)) = q.get_mut(c.owner) else {
            continue;
        };
        flicker.stop();
        if let Some(mut sprite) = sprite {
            set_alpha(&mut sprite, 1.0);
        }
    }
}

pub fn animate_flicker(
    time: Res<Time<Fixed>>,
    mut q: Query<(&mut Flicker, Option<&mut Sprite>), Without<PendingDespawn>>,
) {
    for (mut flicker, sprite) in &mut q {
        if !flicker.active() {
            continue;
        }
        flicker.tick(time.delta());
        if let Some(mut sprite) = sprite {
            set_alpha(&mut sprite, flicker_opacity(flicker.elapsed()));
        }
    }
}

#[inline]
fn set_alpha(sprite: &mut Sprite, alpha: f32) {
    let mut c = sprite.color.to_srgba();
    c.alpha = alpha;
    sprite.color = c.into();
}
