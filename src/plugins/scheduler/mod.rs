//! Timed continuations: "wait, then do X" without blocking the frame loop.
//!
//! Patrol dwell times, the attack recharge and the end of the hit flicker are all
//! scheduled here instead of being polled by the systems that own them.
//!
//! ```text
//!   FixedUpdate
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │ advance_continuations                                             │
//!   │   - ticks the clock by the fixed delta                            │
//!   │   - pops every due (deadline, owner, continuation), in order      │
//!   │   - writes ContinuationDue messages                               │
//!   │                                                                   │
//!   │ consumers (enemies / combat), ordered after the clock             │
//!   │   - read ContinuationDue, filter by kind                          │
//!   │   - owner missing or PendingDespawn -> no-op (implicit cancel)    │
//!   └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each continuation belongs to a `Channel`. Scheduling on an (owner, channel)
//! pair replaces whatever was pending there, so an entity never has two patrol
//! transitions (or two recharges) in flight.

use bevy::prelude::*;

use crate::common::facing::Facing;
use crate::common::state::GameState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Patrol,
    Recharge,
    Flicker,
}

/// What to do when a wait elapses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Continuation {
    /// Enter the walking state heading this way.
    EnterPatrol(Facing),
    /// Refill the owner's attack charge.
    Recharge,
    /// End the owner's post-hit invulnerability.
    EndFlicker,
}

impl Continuation {
    #[inline]
    pub fn channel(self) -> Channel {
        match self {
            Continuation::EnterPatrol(_) => Channel::Patrol,
            Continuation::Recharge => Channel::Recharge,
            Continuation::EndFlicker => Channel::Flicker,
        }
    }
}

/// Emitted when a scheduled continuation comes due.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct ContinuationDue {
    pub owner: Entity,
    pub continuation: Continuation,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    deadline: f64,
    owner: Entity,
    continuation: Continuation,
}

/// Per-tick list of pending continuations plus the clock they are measured on.
#[derive(Resource, Debug, Default)]
pub struct Continuations {
    now: f64,
    pending: Vec<Pending>,
}

impl Continuations {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run `continuation` for `owner` after `after` seconds, replacing anything
    /// pending on the same channel for that owner.
    pub fn schedule(&mut self, owner: Entity, after: f32, continuation: Continuation) {
        let channel = continuation.channel();
        self.pending
            .retain(|p| !(p.owner == owner && p.continuation.channel() == channel));
        self.pending.push(Pending {
            deadline: self.now + f64::from(after.max(0.0)),
            owner,
            continuation,
        });
    }

    pub fn is_pending(&self, owner: Entity, channel: Channel) -> bool {
        self.pending
            .iter()
            .any(|p| p.owner == owner && p.continuation.channel() == channel)
    }

    /// Seconds until the pending continuation on (owner, channel) fires.
    pub fn remaining(&self, owner: Entity, channel: Channel) -> Option<f32> {
        self.pending
            .iter()
            .find(|p| p.owner == owner && p.continuation.channel() == channel)
            .map(|p| (p.deadline - self.now).max(0.0) as f32)
    }

    pub fn clear(&mut self) {
        self.now = 0.0;
        self.pending.clear();
    }

    /// Advance the clock and pop every continuation whose deadline has passed,
    /// earliest first. Ties keep scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<ContinuationDue> {
        self.now += f64::from(dt.max(0.0));
        let now = self.now;

        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.deadline <= now {
                due.push(*p);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline));

        due.into_iter()
            .map(|p| ContinuationDue {
                owner: p.owner,
                continuation: p.continuation,
            })
            .collect()
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Continuations>()
        .add_message::<ContinuationDue>()
        .add_systems(OnEnter(GameState::Loading), clear_continuations)
        .add_systems(
            FixedUpdate,
            advance_continuations.run_if(in_state(GameState::InGame)),
        );
}

/// Tick the clock and publish due continuations.
pub fn advance_continuations(
    time: Res<Time<Fixed>>,
    mut continuations: ResMut<Continuations>,
    mut due: MessageWriter<ContinuationDue>,
) {
    for c in continuations.advance(time.delta_secs()) {
        trace!("continuation due: {:?} for {:?}", c.continuation, c.owner);
        due.write(c);
    }
}

fn clear_continuations(mut continuations: ResMut<Continuations>) {
    continuations.clear();
}
