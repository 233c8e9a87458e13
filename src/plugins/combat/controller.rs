//! Attack intents, recharge and the zone rig that follows the player.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::facing::Facing;
use crate::common::layers::Layer;
use crate::common::lifecycle::PendingDespawn;
use crate::plugins::player::{Intent, Player, PlayerPose};
use crate::plugins::scheduler::{Channel, Continuation, ContinuationDue, Continuations};

use super::components::{AttackEffect, AttackStart, AttackZone, CombatController, Flicker};
use super::{EFFECT_OFFSET, RECHARGE_SECS, ZONE_OFFSET, ZONE_SIZE};

/// Give every fresh player its attack zone, effect sprite and controller.
///
/// Zone and effect are children of the player, so they go when it goes.
pub fn attach_attack_rig(
    mut commands: Commands,
    q_player: Query<Entity, (With<Player>, Without<CombatController>)>,
) {
    for player in &q_player {
        let zone = commands
            .spawn((
                Name::new("AttackZone"),
                AttackZone { owner: player },
                Transform::from_translation(ZONE_OFFSET.extend(0.0)),
                Collider::rectangle(ZONE_SIZE.x, ZONE_SIZE.y),
                ColliderDensity(0.0),
                Sensor,
                CollisionLayers::new(Layer::AttackZone, [Layer::Enemy]),
                CollisionEventsEnabled,
                ChildOf(player),
            ))
            .id();

        let effect = commands
            .spawn((
                Name::new("AttackEffect"),
                AttackEffect { owner: player },
                Sprite {
                    color: Color::srgba(0.6, 0.95, 1.0, 0.85),
                    custom_size: Some(Vec2::new(72.0, 24.0)),
                    ..default()
                },
                Transform::from_translation(EFFECT_OFFSET.extend(0.5)),
                Visibility::Hidden,
                ChildOf(player),
            ))
            .id();

        commands
            .entity(player)
            .insert((CombatController::new(zone, effect), Flicker::default()));
    }
}

pub fn apply_attack_intents(
    mut intents: MessageReader<Intent>,
    mut continuations: ResMut<Continuations>,
    mut q_player: Query<
        (Entity, &mut CombatController, &mut PlayerPose),
        (With<Player>, Without<PendingDespawn>),
    >,
    mut q_effect: Query<&mut Visibility, With<AttackEffect>>,
) {
    for intent in intents.read() {
        for (player, mut ctl, mut pose) in &mut q_player {
            match intent {
                Intent::BeginAttack => match ctl.begin_attack() {
                    AttackStart::Started => {
                        *pose = PlayerPose::Shooting;
                        if let Ok(mut vis) = q_effect.get_mut(ctl.effect()) {
                            *vis = Visibility::Visible;
                        }
                    }
                    AttackStart::Depleted => *pose = PlayerPose::Low,
                    AttackStart::Ignored => {}
                },
                Intent::EndAttack => {
                    if let Ok(mut vis) = q_effect.get_mut(ctl.effect()) {
                        *vis = Visibility::Hidden;
                    }
                    if ctl.end_attack() {
                        *pose = PlayerPose::Low;
                        if !continuations.is_pending(player, Channel::Recharge) {
                            continuations.schedule(player, RECHARGE_SECS, Continuation::Recharge);
                        }
                    }
                }
                Intent::Jump => {}
            }
        }
    }
}

pub fn finish_recharge(
    mut due: MessageReader<ContinuationDue>,
    mut q_player: Query<(&mut CombatController, &mut PlayerPose), Without<PendingDespawn>>,
) {
    for c in due.read() {
        if c.continuation != Continuation::Recharge {
            continue;
        }
        let Ok((mut ctl, mut pose)) = q_player.get_mut(c.owner) else {
            trace!("recharge for gone player {:?}", c.owner);
            continue;
        };
        ctl.recharge();
        *pose = PlayerPose::Idle;
        debug!("Attack recharged");
    }
}

/// Keep the zone and effect in front of the player.
pub fn zone_follows_owner(
    q_player: Query<(&Facing, &CombatController), Without<PendingDespawn>>,
    mut q_parts: Query<(&mut Transform, Option<&mut Sprite>), Without<CombatController>>,
) {
    for (facing, ctl) in &q_player {
        if let Ok((mut tf, _)) = q_parts.get_mut(ctl.zone()) {
            tf.translation = facing.mirror(ZONE_OFFSET).extend(tf.translation.z);
        }
        if let Ok((mut tf, sprite)) = q_parts.get_mut(ctl.effect()) {
            tf.translation = facing.mirror(EFFECT_OFFSET).extend(tf.translation.z);
            if let Some(mut sprite) = sprite {
                sprite.flip_x = *facing == Facing::Left;
            }
        }
    }
}
