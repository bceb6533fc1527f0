//! Starfield - interactive hero animations
//!
//! Core modules:
//! - `sim`: Deterministic simulation (field state, stepper, hit-test resolver, warp)
//! - `renderer`: Scene contract and WebGPU SDF painter
//! - `driver`: Frame cadence, pointer ingestion, completion records
//! - `platform`: Frame scheduling seam and browser host
//! - `config`: Data-driven hero variants

pub mod config;
pub mod driver;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use config::HeroConfig;
pub use driver::{CompletionRecord, Driver, FrameOutput};
pub use error::{Result, StarfieldError};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Engine constants
pub mod consts {
    /// Pointer interaction radius for constellation stars
    pub const CURSOR_RADIUS: f32 = 70.0;
    /// A completed constellation resets after this many milliseconds
    pub const CONSTELLATION_RESET_MS: f64 = 3000.0;
    /// Completion labels stay on screen this long
    pub const LABEL_DURATION_MS: f64 = 2500.0;
    /// Labels float this far above the constellation centroid
    pub const LABEL_OFFSET_Y: f32 = 25.0;

    /// Focal graphic is clickable within radius * this
    pub const FOCAL_HIT_SCALE: f32 = 1.5;

    /// Background placement attempts before ignoring the exclusion zone
    pub const MAX_PLACEMENT_RETRIES: u32 = 64;

    /// Default velocity damping per tick
    pub const PARTICLE_DAMPING: f32 = 0.98;

    /// Twinkle brightness = MID + AMPLITUDE * sin(phase), in [0.4, 1.0]
    pub const TWINKLE_MID: f32 = 0.7;
    pub const TWINKLE_AMPLITUDE: f32 = 0.3;

    /// Glow hint dynamics
    pub const GLOW_RISE: f32 = 0.2;
    pub const GLOW_DECAY_ACTIVE: f32 = 0.015;
    pub const GLOW_DECAY_IDLE: f32 = 0.03;
    /// Activated stars never dim below this glow
    pub const GLOW_FLOOR_ACTIVE: f32 = 0.4;

    /// Deep space clear color (#030014)
    pub const BACKGROUND: [f32; 4] = [3.0 / 255.0, 0.0, 20.0 / 255.0, 1.0];
}

/// Twinkle brightness for an oscillator phase
#[inline]
pub fn twinkle_level(phase: f32) -> f32 {
    consts::TWINKLE_MID + consts::TWINKLE_AMPLITUDE * phase.sin()
}

/// Convert polar (r, theta) around `center` to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(center: Vec2, r: f32, theta: f32) -> Vec2 {
    center + Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Cubic ease-in-out on [0, 1]
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
