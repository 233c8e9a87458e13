//! Player plugin.
//!
//! Pipeline:
//! - Update: sample the keyboard (full app only), write `PlayerInput` + `Intent` messages
//! - FixedUpdate: apply walk velocity, facing and jumps to the dynamic body
//! - FixedPostUpdate: refill the jump budget on landing
//!
//! The rest of the game never looks at devices. Tests and other producers write
//! `PlayerInput` / `Intent` directly.
//!
//! API note (Bevy >= 0.18):
//! - Prefer the `Single` SystemParam (and `Option<Single<...>>`) for single-entity access.
//!   `Single` fails validation if 0 or >1 entities match, and `Option<Single>` lets you
//!   explicitly handle the "missing" case without panics.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::facing::Facing;
use crate::common::layers::Layer;
use crate::common::lifecycle::PendingDespawn;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::level::{ActiveLevel, Platform, load_level};
use crate::plugins::scheduler::advance_continuations;

/// Health at or below this is lethal on the next hit.
pub const MIN_HEALTH: u32 = 1;
/// Jumps available between landings.
pub const JUMPS: u8 = 2;

const BODY_SIZE: Vec2 = Vec2::new(24.0, 30.0);

#[derive(Component, Debug, Clone, Copy)]
pub struct Player {
    /// Horizontal walk speed, world units per second.
    pub speed: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            speed: Tunables::default().player_speed,
        }
    }
}

/// Bounded hit points, `0..=max`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    hp: u32,
    max: u32,
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { hp: max, max }
    }

    #[inline]
    pub fn hp(&self) -> u32 {
        self.hp
    }

    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    /// Take one hit. Returns `true` when the hit is lethal.
    pub fn hurt(&mut self) -> bool {
        if self.hp <= MIN_HEALTH {
            self.hp = 0;
            true
        } else {
            self.hp -= 1;
            false
        }
    }

    /// Restore up to `amount`, never past `max`. Returns the new value.
    pub fn heal(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_add(amount).min(self.max);
        self.hp
    }

    /// Remaining share of `max`, for health bars.
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.hp as f32 / self.max as f32
    }
}

/// Animation the renderer should play for the player.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerPose {
    #[default]
    Idle,
    Shooting,
    /// Out of charge.
    Low,
}

impl PlayerPose {
    pub fn clip(self) -> &'static str {
        match self {
            PlayerPose::Idle => "spookIdle",
            PlayerPose::Shooting => "spookShooting",
            PlayerPose::Low => "spookLow",
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpBudget {
    left: u8,
    max: u8,
}

impl JumpBudget {
    pub fn new(max: u8) -> Self {
        Self { left: max, max }
    }

    #[inline]
    pub fn left(&self) -> u8 {
        self.left
    }

    /// Spend one jump if any is left.
    pub fn try_jump(&mut self) -> bool {
        if self.left == 0 {
            return false;
        }
        self.left -= 1;
        true
    }

    pub fn refill(&mut self) {
        self.left = self.max;
    }
}

/// Held movement intents, already resolved from whatever device produced them.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInput {
    pub move_left: bool,
    pub move_right: bool,
}

impl PlayerInput {
    /// -1, 0 or +1. Both held cancel out.
    pub fn axis(&self) -> f32 {
        match (self.move_left, self.move_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Edge-triggered player intents.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    BeginAttack,
    EndAttack,
    Jump,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerHurt {
    pub hp: u32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerHealed {
    pub hp: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Combat,
    Fell,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDied {
    pub cause: DeathCause,
}

/// Ask for the player to be healed.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealPlayer {
    pub amount: u32,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerInput>()
        .add_message::<Intent>()
        .add_message::<PlayerHurt>()
        .add_message::<PlayerHealed>()
        .add_message::<PlayerDied>()
        .add_message::<HealPlayer>()
        .add_systems(
            OnEnter(GameState::InGame),
            spawn.after(load_level).run_if(resource_exists::<ActiveLevel>),
        )
        .add_systems(Update, gather_input.run_if(in_state(GameState::InGame)))
        .add_systems(
            FixedUpdate,
            (apply_movement, apply_heal_requests)
                .after(advance_continuations)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            reset_jumps
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}

pub fn spawn(mut commands: Commands, level: Res<ActiveLevel>, tunables: Res<Tunables>) {
    let at = match level.data.player_spawn() {
        Ok(p) => p.world(),
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let layers = CollisionLayers::new(
        Layer::Player,
        [Layer::World, Layer::Enemy, Layer::Exit, Layer::Hazard],
    );

    commands.spawn((
        Name::new("Player"),
        Player {
            speed: tunables.player_speed,
        },
        Facing::Right,
        Health::new(tunables.player_max_health),
        PlayerPose::default(),
        JumpBudget::new(JUMPS),
        Sprite {
            color: Color::srgb(0.85, 0.9, 1.0),
            custom_size: Some(Vec2::new(36.0, 42.0)),
            ..default()
        },
        Transform::from_translation(at.extend(1.0)),
        (
            RigidBody::Dynamic,
            Collider::rectangle(BODY_SIZE.x, BODY_SIZE.y),
            LockedAxes::ROTATION_LOCKED,
            Friction::ZERO,
            layers,
            CollisionEventsEnabled,
            LinearVelocity::ZERO,
        ),
        DespawnOnExit(GameState::InGame),
    ));
    debug!("Player spawned at {at}");
}

fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut input: ResMut<PlayerInput>,
    mut intents: MessageWriter<Intent>,
) {
    // Headless apps have no keyboard.
    let Some(keys) = keys else {
        return;
    };

    input.move_left = keys.pressed(KeyCode::ArrowLeft);
    input.move_right = keys.pressed(KeyCode::ArrowRight);

    if keys.just_pressed(KeyCode::KeyZ) {
        intents.write(Intent::BeginAttack);
    }
    if keys.just_released(KeyCode::KeyZ) {
        intents.write(Intent::EndAttack);
    }
    if keys.just_pressed(KeyCode::Space) || keys.just_pressed(KeyCode::ArrowUp) {
        intents.write(Intent::Jump);
    }
}

pub(crate) fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    mut intents: MessageReader<Intent>,
    player: Option<
        Single<
            (&Player, &mut LinearVelocity, &mut Facing, &mut JumpBudget),
            Without<PendingDespawn>,
        >,
    >,
) {
    let jump = intents.read().any(|i| *i == Intent::Jump);
    let Some(player) = player else {
        return;
    };
    let (p, mut vel, mut facing, mut jumps) = player.into_inner();

    let axis = input.axis();
    vel.x = axis * p.speed;
    if axis < 0.0 {
        *facing = Facing::Left;
    } else if axis > 0.0 {
        *facing = Facing::Right;
    }

    if jump && jumps.try_jump() {
        vel.y = tunables.jump_speed;
    }
}

/// Landing on level geometry gives the jumps back.
pub(crate) fn reset_jumps(
    mut started: MessageReader<CollisionStart>,
    q_platform: Query<(), With<Platform>>,
    mut q_player: Query<&mut JumpBudget, (With<Player>, Without<PendingDespawn>)>,
) {
    for ev in started.read() {
        let (a, b) = (ev.collider1, ev.collider2);
        let player = if q_platform.contains(b) {
            a
        } else if q_platform.contains(a) {
            b
        } else {
            continue;
        };
        if let Ok(mut jumps) = q_player.get_mut(player) {
            jumps.refill();
        }
    }
}

pub(crate) fn apply_heal_requests(
    mut requests: MessageReader<HealPlayer>,
    mut q_player: Query<&mut Health, (With<Player>, Without<PendingDespawn>)>,
    mut healed: MessageWriter<PlayerHealed>,
) {
    for req in requests.read() {
        for mut health in &mut q_player {
            let hp = health.heal(req.amount);
            healed.write(PlayerHealed { hp });
        }
    }
}
