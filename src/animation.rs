//! Merge animations: short, time-driven transitions drawn on top of the board.
//!
//! The merge itself is already applied when an animation starts; these only
//! describe how to draw the two sources converging and the result fading in.

use glam::Vec2;
use std::f32::consts::PI;

use crate::block::Block;
use crate::game::BLOCK_SIZE;
use crate::merge::MergeEvent;

/// Total length of a merge animation in seconds.
pub const MERGE_DURATION_SECS: f32 = 0.3;
/// Peak extra scale at the middle of the animation.
const PULSE_AMPLITUDE: f32 = 0.2;

/// Where an animation is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePhase {
    /// Sources moving toward the meeting point (progress < 0.5).
    Converging,
    /// Merged block fading in at the meeting point.
    Revealing,
    Done,
}

/// A square to draw: top-left, side length, value and opacity (0..=255).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub pos: Vec2,
    pub size: f32,
    pub value: u32,
    pub alpha: u8,
}

/// Everything needed to draw one animation for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeFrame {
    Converging([Sprite; 2]),
    Revealing(Sprite),
}

/// Position and value of a block at the instant it merged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub pos: Vec2,
    pub value: u32,
}

impl From<&Block> for Snapshot {
    fn from(b: &Block) -> Self {
        Self {
            pos: b.pos,
            value: b.value(),
        }
    }
}

impl Snapshot {
    fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(BLOCK_SIZE / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeAnimation {
    sources: [Snapshot; 2],
    new_value: u32,
    /// Midpoint of the two source centers.
    target: Vec2,
    progress: f32,
}

impl MergeAnimation {
    pub fn new(first: Snapshot, second: Snapshot, new_value: u32) -> Self {
        let target = (first.center() + second.center()) / 2.0;
        Self {
            sources: [first, second],
            new_value,
            target,
            progress: 0.0,
        }
    }

    pub fn from_event(event: &MergeEvent) -> Self {
        Self::new(
            Snapshot::from(&event.consumed),
            Snapshot::from(&event.survivor),
            event.new_value,
        )
    }

    /// Advance by `dt` seconds. Returns false once finished.
    pub fn update(&mut self, dt: f32) -> bool {
        self.progress += dt.max(0.0) / MERGE_DURATION_SECS;
        if self.progress >= 1.0 {
            self.progress = 1.0;
            return false;
        }
        true
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn new_value(&self) -> u32 {
        self.new_value
    }

    #[inline]
    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn phase(&self) -> MergePhase {
        if self.progress >= 1.0 {
            MergePhase::Done
        } else if self.progress >= 0.5 {
            MergePhase::Revealing
        } else {
            MergePhase::Converging
        }
    }

    /// Scale factor: swells to 1.2 halfway through and back to 1.0.
    pub fn pulse(&self) -> f32 {
        1.0 + PULSE_AMPLITUDE * (self.progress * PI).sin()
    }

    /// Opacity of the merged block; 0 until halfway, then linear to 255.
    pub fn alpha(&self) -> u8 {
        if self.progress < 0.5 {
            return 0;
        }
        (255.0 * (self.progress - 0.5) * 2.0).clamp(0.0, 255.0) as u8
    }

    pub fn frame(&self) -> MergeFrame {
        let size = BLOCK_SIZE * self.pulse();
        if self.progress < 0.5 {
            let t = self.progress * 2.0;
            MergeFrame::Converging(self.sources.map(|s| Sprite {
                pos: s.pos + (self.target - s.center()) * t,
                size,
                value: s.value,
                alpha: u8::MAX,
            }))
        } else {
            MergeFrame::Revealing(Sprite {
                pos: self.target - Vec2::splat(size / 2.0),
                size,
                value: self.new_value,
                alpha: self.alpha(),
            })
        }
    }
}

/// Active merge animations, oldest first.
#[derive(Debug, Clone, Default)]
pub struct MergeAnimations {
    active: Vec<MergeAnimation>,
}

impl MergeAnimations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, animation: MergeAnimation) {
        self.active.push(animation);
    }

    /// Advance all animations and drop the finished ones.
    pub fn update(&mut self, dt: f32) {
        self.active.retain_mut(|a| a.update(dt));
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergeAnimation> {
        self.active.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn sample() -> MergeAnimation {
        MergeAnimation::new(
            Snapshot {
                pos: Vec2::new(0.0, 0.0),
                value: 4,
            },
            Snapshot {
                pos: Vec2::new(40.0, 20.0),
                value: 4,
            },
            8,
        )
    }

    #[test]
    fn test_starts_converging_at_rest_scale() {
        let a = sample();
        assert_eq!(a.phase(), MergePhase::Converging);
        assert_eq!(a.progress(), 0.0);
        assert!((a.pulse() - 1.0).abs() < EPS);
        assert_eq!(a.alpha(), 0);
        // midpoint of centers (30,30) and (70,50)
        assert_eq!(a.target(), Vec2::new(50.0, 40.0));
        match a.frame() {
            MergeFrame::Converging([s1, s2]) => {
                assert_eq!(s1.pos, Vec2::ZERO);
                assert_eq!(s2.pos, Vec2::new(40.0, 20.0));
                assert_eq!(s1.value, 4);
            }
            MergeFrame::Revealing(_) => panic!("expected converging"),
        }
    }

    #[test]
    fn test_sources_meet_at_midpoint() {
        let mut a = sample();
        a.update(MERGE_DURATION_SECS * 0.45);
        let MergeFrame::Converging([s1, s2]) = a.frame() else {
            panic!("expected converging");
        };
        let t = a.progress() * 2.0;
        // both centers move along straight lines toward the target
        let c1 = Vec2::new(30.0, 30.0) + (a.target() - Vec2::new(30.0, 30.0)) * t;
        assert!((s1.pos - (c1 - Vec2::splat(30.0))).length() < EPS);
        assert!(s2.pos.x < 40.0 && s2.pos.x > 20.0);
        assert!(s1.size > BLOCK_SIZE);
    }

    #[test]
    fn test_reveal_fades_in() {
        let mut a = sample();
        assert!(a.update(MERGE_DURATION_SECS * 0.75));
        assert_eq!(a.phase(), MergePhase::Revealing);
        assert!((a.alpha() as i32 - 127).abs() <= 1);
        let MergeFrame::Revealing(s) = a.frame() else {
            panic!("expected revealing");
        };
        assert_eq!(s.value, 8);
        assert!((s.pos + Vec2::splat(s.size / 2.0) - a.target()).length() < EPS);
        let expected = 1.0 + 0.2 * (0.75 * PI).sin();
        assert!((s.size - BLOCK_SIZE * expected).abs() < 1e-3);
    }

    #[test]
    fn test_finishes_after_duration() {
        let mut a = sample();
        assert!(a.update(0.1));
        assert!(a.update(0.1));
        assert!(!a.update(0.11));
        assert_eq!(a.progress(), 1.0);
        assert_eq!(a.phase(), MergePhase::Done);
        assert_eq!(a.alpha(), 255);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut a = sample();
        let mut last = a.progress();
        for dt in [0.0, 0.01, 0.0, 0.05, -0.2, 0.02] {
            a.update(dt);
            assert!(a.progress() >= last);
            last = a.progress();
        }
    }

    #[test]
    fn test_collection_retires_finished() {
        let mut set = MergeAnimations::new();
        set.push(sample());
        set.update(0.2);
        set.push(sample());
        assert_eq!(set.len(), 2);
        set.update(0.15);
        // first has 0.35 s, second 0.15 s
        assert_eq!(set.len(), 1);
        set.update(0.2);
        assert!(set.is_empty());
    }
}
