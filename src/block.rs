//! Block entities and the registry that owns them.

use glam::Vec2;
use rand::Rng;

use crate::game::{BLOCK_SIZE, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};

/// Horizontal launch speed range (pixels per reference tick).
const SPAWN_VX: (f32, f32) = (-2.0, 2.0);
/// Vertical launch speed range; negative is up.
const SPAWN_VY: (f32, f32) = (-10.0, -5.0);

/// One numbered tile. Position is the top-left corner of its bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Subject to gravity while true; settled otherwise.
    pub falling: bool,
    value: u32,
}

impl Block {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, value: u32) -> Self {
        debug_assert!(value >= 2 && value.is_power_of_two(), "block value {value}");
        Self {
            id,
            pos,
            vel,
            falling: true,
            value,
        }
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Side length; identical for every block.
    #[inline]
    pub fn size(&self) -> f32 {
        BLOCK_SIZE
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(BLOCK_SIZE / 2.0)
    }

    /// Strict bounding-box overlap; boxes that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Block) -> bool {
        self.pos.x < other.pos.x + BLOCK_SIZE
            && other.pos.x < self.pos.x + BLOCK_SIZE
            && self.pos.y < other.pos.y + BLOCK_SIZE
            && other.pos.y < self.pos.y + BLOCK_SIZE
    }

    /// Left the playfield through the top, left or right edge.
    pub fn out_of_bounds(&self) -> bool {
        self.pos.y < -BLOCK_SIZE || self.pos.x < -BLOCK_SIZE || self.pos.x > PLAYFIELD_WIDTH
    }

    /// Double the value in place (merge survivor). Values already at the
    /// top power of two (2^31) stay unchanged.
    pub(crate) fn promote(&mut self) -> u32 {
        if let Some(doubled) = self.value.checked_mul(2) {
            self.value = doubled;
        }
        self.value
    }
}

/// Live blocks in insertion order. Scan order for merges follows this order.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: Vec<Block>,
    next_id: u32,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a falling block with explicit physical state. Returns its id.
    pub fn insert(&mut self, pos: Vec2, vel: Vec2, value: u32) -> u32 {
        self.push(pos, vel, value).id
    }

    fn push(&mut self, pos: Vec2, vel: Vec2, value: u32) -> Block {
        let block = Block::new(self.next_id, pos, vel, value);
        self.next_id = self.next_id.wrapping_add(1);
        self.blocks.push(block);
        block
    }

    /// Launch a new block from just below the bottom edge at a random column offset.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Block {
        let x = rng.random_range(0.0..=PLAYFIELD_WIDTH - BLOCK_SIZE);
        let vx = rng.random_range(SPAWN_VX.0..=SPAWN_VX.1);
        let vy = rng.random_range(SPAWN_VY.0..=SPAWN_VY.1);
        // 4 in 5 spawns are 2s
        let value = if rng.random_ratio(4, 5) { 2 } else { 4 };
        self.push(Vec2::new(x, PLAYFIELD_HEIGHT), Vec2::new(vx, vy), value)
    }

    pub fn remove(&mut self, id: u32) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(idx))
    }

    pub fn get(&self, id: u32) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    #[inline]
    pub fn all(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    pub fn retain<F: FnMut(&Block) -> bool>(&mut self, f: F) {
        self.blocks.retain(f);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_ranges() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut reg = BlockRegistry::new();
        let mut twos = 0;
        for _ in 0..500 {
            let b = reg.spawn(&mut rng);
            assert!(b.falling);
            assert_eq!(b.pos.y, PLAYFIELD_HEIGHT);
            assert!((0.0..=PLAYFIELD_WIDTH - BLOCK_SIZE).contains(&b.pos.x));
            assert!((-2.0..=2.0).contains(&b.vel.x));
            assert!((-10.0..=-5.0).contains(&b.vel.y));
            assert!(b.value() == 2 || b.value() == 4);
            if b.value() == 2 {
                twos += 1;
            }
        }
        assert_eq!(reg.len(), 500);
        // 80% expected; wide margin for a fixed seed
        assert!((330..=470).contains(&twos), "twos = {twos}");
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut reg = BlockRegistry::new();
        let a = reg.insert(Vec2::ZERO, Vec2::ZERO, 2);
        let b = reg.insert(Vec2::ZERO, Vec2::ZERO, 2);
        reg.remove(a);
        let c = reg.insert(Vec2::ZERO, Vec2::ZERO, 4);
        assert!(a < b && b < c);
        let ids: Vec<u32> = reg.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![b, c]);
    }

    #[test]
    fn test_remove_missing_is_none() {
        let mut reg = BlockRegistry::new();
        assert!(reg.remove(42).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Block::new(0, Vec2::new(0.0, 0.0), Vec2::ZERO, 2);
        let touching = Block::new(1, Vec2::new(BLOCK_SIZE, 0.0), Vec2::ZERO, 2);
        let inside = Block::new(2, Vec2::new(BLOCK_SIZE - 1.0, 10.0), Vec2::ZERO, 2);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
    }

    #[test]
    fn test_out_of_bounds_edges() {
        let at = |x: f32, y: f32| Block::new(0, Vec2::new(x, y), Vec2::ZERO, 2);
        assert!(!at(0.0, PLAYFIELD_HEIGHT).out_of_bounds());
        assert!(!at(-BLOCK_SIZE, 0.0).out_of_bounds());
        assert!(at(-BLOCK_SIZE - 0.1, 0.0).out_of_bounds());
        assert!(at(PLAYFIELD_WIDTH + 0.1, 0.0).out_of_bounds());
        assert!(at(100.0, -BLOCK_SIZE - 0.1).out_of_bounds());
    }

    #[test]
    fn test_promote_doubles() {
        let mut b = Block::new(0, Vec2::ZERO, Vec2::ZERO, 8);
        assert_eq!(b.promote(), 16);
        assert_eq!(b.value(), 16);
        assert_eq!(b.center(), Vec2::splat(BLOCK_SIZE / 2.0));
    }

    #[test]
    fn test_promote_stops_at_top_power_of_two() {
        let mut b = Block::new(0, Vec2::ZERO, Vec2::ZERO, 1 << 31);
        assert_eq!(b.promote(), 1 << 31);
        assert!(b.value().is_power_of_two());
    }
}
