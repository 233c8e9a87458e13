use std::time::Duration;

use bevy::prelude::*;

use super::FLICKER_SECS;

/// Per-attack charge.
///
/// `Firing` is an attack in progress that has not hit anything yet. The first
/// zone kill (or the end of the attack) spends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttackCharge {
    #[default]
    Full,
    Firing,
    Empty,
}

/// Result of a begin-attack intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStart {
    Started,
    /// No charge: play the out-of-charge pose, stay idle.
    Depleted,
    /// Already attacking.
    Ignored,
}

/// Ranged attack state, owned by the player.
///
/// Holds direct handles to the player's attack zone and effect sprite.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatController {
    charge: AttackCharge,
    attacking: bool,
    zone: Entity,
    effect: Entity,
}

impl CombatController {
    pub fn new(zone: Entity, effect: Entity) -> Self {
        Self {
            charge: AttackCharge::Full,
            attacking: false,
            zone,
            effect,
        }
    }

    #[inline]
    pub fn charge(&self) -> AttackCharge {
        self.charge
    }

    #[inline]
    pub fn attacking(&self) -> bool {
        self.attacking
    }

    #[inline]
    pub fn zone(&self) -> Entity {
        self.zone
    }

    #[inline]
    pub fn effect(&self) -> Entity {
        self.effect
    }

    pub fn begin_attack(&mut self) -> AttackStart {
        if self.attacking {
            return AttackStart::Ignored;
        }
        match self.charge {
            AttackCharge::Full => {
                self.charge = AttackCharge::Firing;
                self.attacking = true;
                AttackStart::Started
            }
            AttackCharge::Firing | AttackCharge::Empty => AttackStart::Depleted,
        }
    }

    /// Stop attacking. Returns `true` when the charge needs a recharge.
    pub fn end_attack(&mut self) -> bool {
        self.attacking = false;
        if self.charge == AttackCharge::Full {
            return false;
        }
        self.charge = AttackCharge::Empty;
        true
    }

    /// Spend the charge of the running attack. Returns `true` if it was live.
    pub fn exhaust(&mut self) -> bool {
        let live = self.charge == AttackCharge::Firing;
        if live {
            self.charge = AttackCharge::Empty;
        }
        live
    }

    /// A held, spent attack took out an enemy by touch. The attack is over;
    /// the charge stays empty until `EndAttack` schedules the recharge.
    pub fn spend_on_contact(&mut self) {
        self.charge = AttackCharge::Empty;
        self.attacking = false;
    }

    pub fn recharge(&mut self) {
        self.charge = AttackCharge::Full;
    }

    /// An attack is live: shootable enemies die this tick.
    #[inline]
    pub fn can_zone_kill(&self) -> bool {
        self.attacking && self.charge == AttackCharge::Firing
    }

    /// Still attacking after the charge ran out.
    #[inline]
    pub fn is_depleted_attack(&self) -> bool {
        self.attacking && self.charge == AttackCharge::Empty
    }
}

/// Sensor in front of the player. Enemies overlapping it are shootable.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackZone {
    pub owner: Entity,
}

/// Visible muzzle effect, shown only while attacking.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackEffect {
    pub owner: Entity,
}

/// Post-hit invulnerability.
///
/// Always present on the player. The `EndFlicker` continuation decides when
/// the window closes; the timer only drives the opacity ramp.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Flicker {
    active: bool,
    timer: Timer,
}

impl Default for Flicker {
    fn default() -> Self {
        Self {
            active: false,
            timer: Timer::from_seconds(FLICKER_SECS, TimerMode::Once),
        }
    }
}

impl Flicker {
    #[inline]
    pub fn active(&self) -> bool {
        self.active
    }

    /// Seconds since the flicker started, capped at its duration.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.timer.elapsed_secs()
    }

    pub fn start(&mut self) {
        self.active = true;
        self.timer.reset();
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.timer.reset();
    }

    pub fn tick(&mut self, delta: Duration) {
        if self.active {
            self.timer.tick(delta);
        }
    }
}
