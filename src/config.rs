//! Hero configuration
//!
//! One engine drives every hero variant; the differences (which catalog,
//! how many background stars, which force field and boundary policy) live
//! here as data. Configs are serde-friendly so a host page can ship JSON.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, StarfieldError};
use crate::sim::Catalog;

/// Inclusive sampling range for per-entity attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Draw a value from the span (always consumes one RNG sample)
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let t: f32 = rng.random();
        self.min + (self.max - self.min) * t
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 || self.min > self.max
        {
            return Err(StarfieldError::config(format!(
                "{what} span [{}, {}] must be finite, non-negative and ordered",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Per-star rendering hints and twinkle rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarStyle {
    pub size: Span,
    pub opacity: Span,
    /// Twinkle phase advance per tick (radians)
    pub twinkle_speed: Span,
}

/// Rectangle (in surface fractions) kept clear of background stars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExclusionZone {
    pub center: [f32; 2],
    pub half_extent: [f32; 2],
}

impl ExclusionZone {
    /// Check if a surface point falls inside the zone
    pub fn contains(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        (x - self.center[0] * width).abs() < self.half_extent[0] * width
            && (y - self.center[1] * height).abs() < self.half_extent[1] * height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub count: usize,
    pub style: StarStyle,
    #[serde(default)]
    pub exclusion: Option<ExclusionZone>,
}

/// Direction of the pointer force on free particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceMode {
    Repel,
    Attract,
}

/// Pointer force with linear falloff, zero beyond `radius`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceField {
    pub mode: ForceMode,
    pub radius: f32,
    /// Velocity change per tick at zero distance
    pub strength: f32,
    /// Strength multiplier while the pointer is pressed
    #[serde(default = "default_pressed_multiplier")]
    pub pressed_multiplier: f32,
}

fn default_pressed_multiplier() -> f32 {
    1.0
}

impl ForceField {
    /// Force magnitude at distance `dist` (0 outside the radius)
    #[inline]
    pub fn magnitude(&self, dist: f32, pressed: bool) -> f32 {
        if dist <= 0.0 || dist >= self.radius {
            return 0.0;
        }
        let falloff = (self.radius - dist) / self.radius;
        let boost = if pressed { self.pressed_multiplier } else { 1.0 };
        falloff * self.strength * boost
    }
}

/// What happens when a free particle reaches the surface edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Re-enter from the opposite edge once `margin` past the edge
    Wrap { margin: f32 },
    /// Clamp to the edge and bounce, keeping `restitution` of the speed
    Reflect { restitution: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    pub count: usize,
    /// Initial velocity components are drawn from ±initial_speed/2
    pub initial_speed: f32,
    pub size: Span,
    pub opacity: Span,
    pub force: ForceField,
    /// Velocity multiplier per tick, in (0, 1)
    pub damping: f32,
    /// Random velocity jitter per tick
    #[serde(default)]
    pub drift: f32,
    pub boundary: BoundaryPolicy,
    /// Draw mesh lines between particles closer than this
    #[serde(default)]
    pub link_distance: Option<f32>,
    /// Finite lifetimes, respawning and press bursts
    #[serde(default)]
    pub lifecycle: Option<ParticleLifecycle>,
}

/// Particles that age out, respawn and burst from the pointer on press
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleLifecycle {
    /// Lifetime in ticks
    pub lifetime: Span,
    /// Ticks between respawns while fewer than `count` particles are alive
    pub respawn_every: u32,
    /// Particles spawned at the pointer on each press
    pub burst_count: usize,
    /// Burst velocity components are drawn from ±burst_speed/2
    pub burst_speed: f32,
}

/// Orbiting accretion disk around the focal graphic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskConfig {
    pub count: usize,
    /// Orbit radius as a fraction of the ellipse half-axes
    pub radius: Span,
    /// Ellipse half-axes as fractions of the short surface side
    pub width: f32,
    pub height: f32,
    /// Angular speed multiplier, 0 freezes the disk
    #[serde(default = "default_spin")]
    pub spin: f32,
}

fn default_spin() -> f32 {
    1.0
}

/// Hit-test and reset timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfig {
    pub radius: f32,
    /// A completed constellation resets after this long
    pub reset_after_ms: f64,
    /// Completion labels are shown for this long
    pub label_duration_ms: f64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            radius: CURSOR_RADIUS,
            reset_after_ms: CONSTELLATION_RESET_MS,
            label_duration_ms: LABEL_DURATION_MS,
        }
    }
}

/// Clickable central graphic (the black hole)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalRegion {
    pub center: [f32; 2],
    /// Radius as a fraction of the shorter surface side
    pub radius_fraction: f32,
    /// Hit area is the radius scaled by this factor
    #[serde(default = "default_hit_scale")]
    pub hit_scale: f32,
}

fn default_hit_scale() -> f32 {
    FOCAL_HIT_SCALE
}

/// Complete description of one hero variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroConfig {
    #[serde(default)]
    pub catalog: Catalog,
    pub member_style: StarStyle,
    pub background: BackgroundConfig,
    #[serde(default)]
    pub particles: Option<ParticleConfig>,
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub focal: Option<FocalRegion>,
    #[serde(default)]
    pub disk: Option<DiskConfig>,
}

impl HeroConfig {
    /// Twelve-constellation discovery game over a plain starfield
    pub fn constellation() -> Self {
        Self {
            catalog: Catalog::classic(),
            member_style: StarStyle {
                size: Span::new(2.0, 3.5),
                opacity: Span::fixed(0.35),
                twinkle_speed: Span::new(0.02, 0.05),
            },
            background: BackgroundConfig {
                count: 80,
                style: StarStyle {
                    size: Span::new(0.3, 1.5),
                    opacity: Span::new(0.1, 0.35),
                    twinkle_speed: Span::new(0.01, 0.05),
                },
                exclusion: None,
            },
            particles: None,
            activation: ActivationConfig::default(),
            focal: None,
            disk: None,
        }
    }

    /// Corner constellations around a clickable black hole
    pub fn black_hole() -> Self {
        Self {
            catalog: Catalog::horizon(),
            member_style: StarStyle {
                size: Span::new(2.0, 3.0),
                opacity: Span::fixed(0.5),
                twinkle_speed: Span::new(0.02, 0.04),
            },
            background: BackgroundConfig {
                count: 120,
                style: StarStyle {
                    size: Span::new(0.3, 1.8),
                    opacity: Span::new(0.1, 0.5),
                    twinkle_speed: Span::new(0.015, 0.045),
                },
                exclusion: Some(ExclusionZone {
                    center: [0.5, 0.5],
                    half_extent: [0.25, 0.2],
                }),
            },
            particles: None,
            activation: ActivationConfig {
                radius: 60.0,
                ..ActivationConfig::default()
            },
            focal: Some(FocalRegion {
                center: [0.5, 0.5],
                radius_fraction: 0.08,
                hit_scale: FOCAL_HIT_SCALE,
            }),
            disk: Some(DiskConfig {
                count: 500,
                radius: Span::new(0.15, 0.65),
                width: 0.55,
                height: 0.12,
                spin: 1.0,
            }),
        }
    }

    /// Sparse drifting particles pushed away by the pointer
    pub fn particle_field() -> Self {
        Self {
            catalog: Catalog::empty(),
            member_style: StarStyle {
                size: Span::fixed(2.0),
                opacity: Span::fixed(0.35),
                twinkle_speed: Span::fixed(0.0),
            },
            background: BackgroundConfig {
                count: 0,
                style: StarStyle {
                    size: Span::fixed(1.0),
                    opacity: Span::fixed(0.2),
                    twinkle_speed: Span::fixed(0.0),
                },
                exclusion: None,
            },
            particles: Some(ParticleConfig {
                count: 25,
                initial_speed: 0.3,
                size: Span::new(1.0, 3.0),
                opacity: Span::new(0.1, 0.4),
                force: ForceField {
                    mode: ForceMode::Repel,
                    radius: 150.0,
                    strength: 0.5,
                    pressed_multiplier: 1.0,
                },
                damping: PARTICLE_DAMPING,
                drift: 0.02,
                boundary: BoundaryPolicy::Wrap { margin: 10.0 },
                link_distance: Some(120.0),
                lifecycle: None,
            }),
            activation: ActivationConfig::default(),
            focal: None,
            disk: None,
        }
    }

    /// Denser particles pulled toward the pointer, harder while pressed
    pub fn interactive() -> Self {
        let mut config = Self::particle_field();
        config.particles = Some(ParticleConfig {
            count: 80,
            initial_speed: 2.0,
            size: Span::new(1.5, 3.5),
            opacity: Span::new(0.3, 0.8),
            force: ForceField {
                mode: ForceMode::Attract,
                radius: 400.0,
                strength: 0.15,
                pressed_multiplier: 5.0,
            },
            damping: PARTICLE_DAMPING,
            drift: 0.0,
            boundary: BoundaryPolicy::Reflect { restitution: 0.8 },
            link_distance: None,
            lifecycle: Some(ParticleLifecycle {
                lifetime: Span::new(300.0, 500.0),
                respawn_every: 6,
                burst_count: 8,
                burst_speed: 8.0,
            }),
        });
        config
    }

    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tuning values the simulation cannot honor
    pub fn validate(&self) -> Result<()> {
        self.member_style.size.validate("member size")?;
        self.member_style.opacity.validate("member opacity")?;
        self.member_style.twinkle_speed.validate("member twinkle")?;
        self.background.style.size.validate("background size")?;
        self.background.style.opacity.validate("background opacity")?;
        self.background.style.twinkle_speed.validate("background twinkle")?;

        if let Some(zone) = &self.background.exclusion {
            let finite = zone
                .center
                .iter()
                .chain(zone.half_extent.iter())
                .all(|v| v.is_finite());
            if !finite || zone.half_extent[0] < 0.0 || zone.half_extent[1] < 0.0 {
                return Err(StarfieldError::config("exclusion zone must be finite and non-negative"));
            }
        }

        let act = &self.activation;
        if !(act.radius.is_finite() && act.radius > 0.0) {
            return Err(StarfieldError::config(format!(
                "activation radius {} must be positive",
                act.radius
            )));
        }
        if !(act.label_duration_ms.is_finite() && act.label_duration_ms >= 0.0) {
            return Err(StarfieldError::config("label duration must be non-negative"));
        }
        if !(act.reset_after_ms.is_finite() && act.reset_after_ms >= act.label_duration_ms) {
            return Err(StarfieldError::config(format!(
                "reset delay {}ms must be at least the label duration {}ms",
                act.reset_after_ms, act.label_duration_ms
            )));
        }

        if let Some(p) = &self.particles {
            p.size.validate("particle size")?;
            p.opacity.validate("particle opacity")?;
            if !(p.damping > 0.0 && p.damping < 1.0) {
                return Err(StarfieldError::config(format!(
                    "damping {} must be in (0, 1)",
                    p.damping
                )));
            }
            if !(p.force.radius.is_finite() && p.force.radius > 0.0) {
                return Err(StarfieldError::config("force radius must be positive"));
            }
            let non_negative = |v: f32| v.is_finite() && v >= 0.0;
            if !non_negative(p.force.strength)
                || !non_negative(p.force.pressed_multiplier)
                || !non_negative(p.initial_speed)
                || !non_negative(p.drift)
            {
                return Err(StarfieldError::config(
                    "force strength, initial speed and drift must be non-negative",
                ));
            }
            match p.boundary {
                BoundaryPolicy::Wrap { margin } if !non_negative(margin) => {
                    return Err(StarfieldError::config("wrap margin must be non-negative"));
                }
                BoundaryPolicy::Reflect { restitution } if !(0.0..=1.0).contains(&restitution) => {
                    return Err(StarfieldError::config("restitution must be in [0, 1]"));
                }
                _ => {}
            }
            if let Some(d) = p.link_distance {
                if !(d.is_finite() && d > 0.0) {
                    return Err(StarfieldError::config("link distance must be positive"));
                }
            }
            if let Some(life) = &p.lifecycle {
                life.lifetime.validate("particle lifetime")?;
                if life.lifetime.min < 1.0 || life.respawn_every == 0 {
                    return Err(StarfieldError::config(
                        "particle lifetime and respawn interval must be at least one tick",
                    ));
                }
                if !non_negative(life.burst_speed) {
                    return Err(StarfieldError::config("burst speed must be non-negative"));
                }
            }
        }

        if let Some(focal) = &self.focal {
            if !(focal.radius_fraction > 0.0 && focal.hit_scale > 0.0) {
                return Err(StarfieldError::config(
                    "focal radius and hit scale must be positive",
                ));
            }
        }

        if let Some(disk) = &self.disk {
            disk.radius.validate("disk radius")?;
            let positive = |v: f32| v.is_finite() && v > 0.0;
            if !positive(disk.width) || !positive(disk.height) {
                return Err(StarfieldError::config("disk half-axes must be positive"));
            }
            if !(disk.spin.is_finite() && disk.spin >= 0.0) {
                return Err(StarfieldError::config("disk spin must be non-negative"));
            }
        }

        Ok(())
    }
}
