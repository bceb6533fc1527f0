//! Warp transition
//!
//! Full-screen "jump to hyperspace" played after the focal graphic is
//! clicked. The hole at the center grows until it swallows the screen while
//! light streaks race outward, then everything fades to black. The timeline
//! is a fixed number of frames and fully determined by the seed.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::{ease_in_out_cubic, polar_to_cartesian};

/// Frames in the whole transition
pub const WARP_FRAMES: u32 = 80;
/// Number of light streaks
pub const WARP_STREAKS: usize = 400;
/// Hole radius at the start, fraction of the shorter side
const HOLE_START_FRACTION: f32 = 0.08;
/// Hole radius at the end, fraction of the longer side
const HOLE_END_FRACTION: f32 = 1.2;
/// Streak distance wraps at this fraction of the longer side
const STREAK_WRAP_FRACTION: f32 = 0.8;
/// Fade to black starts at this progress
const FADE_START: f32 = 0.7;
/// Glowing ring disappears at this progress
const RING_END: f32 = 0.8;

/// One light streak, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Streak {
    pub angle: f32,
    pub distance: f32,
    pub speed: f32,
    /// Hue in degrees (orange-gold band)
    pub hue: f32,
    pub size: f32,
}

/// A streak as drawn on one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreakSegment {
    pub tail: Vec2,
    pub head: Vec2,
    pub width: f32,
    pub hue: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone)]
pub struct WarpTransition {
    pub width: f32,
    pub height: f32,
    pub streaks: Vec<Streak>,
    frame: u32,
}

impl WarpTransition {
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let long_side = width.max(height);
        let streaks = (0..WARP_STREAKS)
            .map(|_| Streak {
                angle: rng.random::<f32>() * TAU,
                distance: 50.0 + rng.random::<f32>() * long_side,
                speed: 0.5 + rng.random::<f32>() * 2.0,
                hue: 15.0 + rng.random::<f32>() * 45.0,
                size: 1.0 + rng.random::<f32>() * 2.0,
            })
            .collect();

        Self {
            width,
            height,
            streaks,
            frame: 0,
        }
    }

    /// Move one frame along the timeline (no-op once finished)
    pub fn advance(&mut self) {
        if self.frame < WARP_FRAMES {
            self.frame += 1;
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= WARP_FRAMES
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Linear progress in [0, 1]
    pub fn progress(&self) -> f32 {
        self.frame as f32 / WARP_FRAMES as f32
    }

    pub fn eased(&self) -> f32 {
        ease_in_out_cubic(self.progress())
    }

    pub fn hole_radius(&self) -> f32 {
        let start = self.width.min(self.height) * HOLE_START_FRACTION;
        let end = self.width.max(self.height) * HOLE_END_FRACTION;
        start + (end - start) * self.eased().powf(1.2)
    }

    fn warp_speed(&self) -> f32 {
        self.eased().powi(2) * 50.0
    }

    /// Streaks visible on the current frame
    pub fn segments(&self) -> impl Iterator<Item = StreakSegment> + '_ {
        let center = self.center();
        let eased = self.eased();
        let progress = self.progress();
        let hole = self.hole_radius();
        let speed = self.warp_speed();
        let wrap = self.width.max(self.height) * STREAK_WRAP_FRACTION;
        let alpha = (eased * 2.0).min(1.0) * (1.0 - progress.powi(3));
        let frame = self.frame as f32;

        self.streaks.iter().filter_map(move |s| {
            let travelled = s.distance + speed * s.speed * frame * 0.5;
            let dist = travelled % wrap + hole * 1.2;
            if dist <= hole {
                return None;
            }
            let length = speed * s.speed * 0.8;
            Some(StreakSegment {
                tail: polar_to_cartesian(center, dist - length, s.angle),
                head: polar_to_cartesian(center, dist, s.angle),
                width: s.size * (1.0 + eased * 2.0),
                hue: s.hue,
                alpha,
            })
        })
    }

    /// Opacity of the glowing ring around the hole
    pub fn ring_alpha(&self) -> f32 {
        let progress = self.progress();
        if progress < RING_END {
            (1.0 - progress / RING_END) * 0.7
        } else {
            0.0
        }
    }

    /// Opacity of the black overlay at the end
    pub fn fade_alpha(&self) -> f32 {
        ((self.progress() - FADE_START) / (1.0 - FADE_START)).clamp(0.0, 1.0)
    }
}
