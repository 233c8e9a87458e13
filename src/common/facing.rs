//! Horizontal facing shared by the player and enemies.

use bevy::prelude::*;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// -1 for left, +1 for right.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Column step when scanning the tile grid in this direction.
    #[inline]
    pub fn step(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Mirror a right-facing offset for this facing.
    #[inline]
    pub fn mirror(self, offset: Vec2) -> Vec2 {
        Vec2::new(offset.x * self.sign(), offset.y)
    }
}

/// Sprites face the way their entity faces. Art is drawn facing right.
pub fn sync_facing_sprites(mut q: Query<(&Facing, &mut Sprite), Changed<Facing>>) {
    for (facing, mut sprite) in &mut q {
        sprite.flip_x = *facing == Facing::Left;
    }
}
