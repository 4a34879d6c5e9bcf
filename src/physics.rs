//! Per-frame motion: gravity, friction, floor contact, grid snap and off-field removal.
//!
//! Tuning constants are expressed per reference tick (1/60 s); a frame of
//! `dt` seconds advances `dt * 60` reference ticks.

use glam::Vec2;

use crate::block::{Block, BlockRegistry};
use crate::game::{
    BLOCK_SIZE, CELL_INSET, GRID_COLUMNS, GRID_ROWS, GRID_SIZE, PLAYFIELD_HEIGHT,
};

/// Downward acceleration per reference tick.
pub const GRAVITY: f32 = 0.5;
/// Velocity multiplier per reference tick.
pub const FRICTION: f32 = 0.98;
pub const REFERENCE_TICK_RATE: f32 = 60.0;
/// Both velocity components below this snap the block onto the grid.
pub const REST_SPEED: f32 = 0.5;
/// Gap kept between a landed block and the bottom edge.
pub const FLOOR_MARGIN: f32 = 2.0;

/// Highest y a block's top edge may reach.
pub const FLOOR_Y: f32 = PLAYFIELD_HEIGHT - BLOCK_SIZE - FLOOR_MARGIN;

/// Nearest grid cell origin (plus inset) for a position, clamped to the grid.
/// Ties round to even.
pub fn snap_to_grid(pos: Vec2) -> Vec2 {
    let col = (pos.x / GRID_SIZE)
        .round_ties_even()
        .clamp(0.0, (GRID_COLUMNS - 1) as f32);
    let row = (pos.y / GRID_SIZE)
        .round_ties_even()
        .clamp(0.0, (GRID_ROWS - 1) as f32);
    Vec2::new(col, row) * GRID_SIZE + Vec2::splat(CELL_INSET)
}

/// Advance every block by `dt` seconds and drop the ones that left the playfield.
/// Returns how many were dropped. Zero (or negative) `dt` changes nothing.
///
/// Bounds are checked on the moved position, before landing and grid snap,
/// so an off-field block is never pulled back onto the grid.
pub fn step(registry: &mut BlockRegistry, dt: f32) -> usize {
    if dt.is_nan() || dt <= 0.0 {
        return 0;
    }
    let ticks = dt * REFERENCE_TICK_RATE;
    let friction = FRICTION.powf(ticks);

    for block in registry.iter_mut() {
        integrate(block, ticks, friction);
    }

    let before = registry.len();
    registry.retain(|b| {
        let gone = b.out_of_bounds();
        if gone {
            log::trace!("block {} left the playfield at ({:.1}, {:.1})", b.id, b.pos.x, b.pos.y);
        }
        !gone
    });

    for block in registry.iter_mut() {
        settle(block);
    }
    before - registry.len()
}

fn integrate(block: &mut Block, ticks: f32, friction: f32) {
    if block.falling {
        block.vel.y += GRAVITY * ticks;
    }
    block.vel *= friction;
    block.pos += block.vel * ticks;
}

fn settle(block: &mut Block) {
    // Landing stops vertical motion only; horizontal drift is left for the snap below.
    if block.pos.y >= FLOOR_Y {
        block.pos.y = FLOOR_Y;
        block.vel.y = 0.0;
        block.falling = false;
    }

    if block.vel.x.abs() < REST_SPEED && block.vel.y.abs() < REST_SPEED {
        block.pos = snap_to_grid(block.pos);
        block.vel = Vec2::ZERO;
        block.falling = false;
    }
}
