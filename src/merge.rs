//! Collision scan and merge resolution.

use crate::block::{Block, BlockRegistry};

/// Running total of merged values. Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(u64);

impl Score {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    fn add(&mut self, amount: u32) {
        self.0 = self.0.saturating_add(u64::from(amount));
    }
}

/// One resolved merge. Snapshots are taken before the survivor is promoted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    /// Removed from the registry.
    pub consumed: Block,
    /// Still live, now carrying `new_value`.
    pub survivor: Block,
    pub new_value: u32,
}

/// Pair up overlapping equal-valued blocks and merge them.
///
/// Pairs are tested in registry order (i < j) against the state at entry;
/// the earlier block of a pair is consumed and the later one doubles. A block
/// takes part in at most one merge per call. Returns the merges in the order
/// they were found.
pub fn resolve(registry: &mut BlockRegistry, score: &mut Score) -> Vec<MergeEvent> {
    let snapshot = registry.all();
    let mut claimed = vec![false; snapshot.len()];
    let mut events = Vec::new();

    for i in 0..snapshot.len() {
        if claimed[i] {
            continue;
        }
        let a = &snapshot[i];
        for j in (i + 1)..snapshot.len() {
            if claimed[j] {
                continue;
            }
            let b = &snapshot[j];
            if a.value() != b.value() || !a.overlaps(b) {
                continue;
            }
            // 2^31 has no larger power of two in u32
            let Some(new_value) = a.value().checked_mul(2) else {
                continue;
            };
            claimed[i] = true;
            claimed[j] = true;
            events.push(MergeEvent {
                consumed: *a,
                survivor: *b,
                new_value,
            });
            break;
        }
    }

    if events.is_empty() {
        return events;
    }

    registry.retain(|b| !events.iter().any(|e| e.consumed.id == b.id));
    for event in &events {
        if let Some(survivor) = registry.get_mut(event.survivor.id) {
            survivor.promote();
        }
        score.add(event.new_value);
        log::debug!(
            "merge {} + {} -> {} (block {} absorbed)",
            event.consumed.value(),
            event.survivor.value(),
            event.new_value,
            event.consumed.id
        );
    }
    events
}
