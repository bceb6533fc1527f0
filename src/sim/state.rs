//! Field state and core simulation types
//!
//! Everything the stepper and resolver mutate lives here. A field is built
//! once per surface size; a resize builds a fresh one.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{
    ActivationConfig, DiskConfig, ExclusionZone, FocalRegion, HeroConfig, ParticleConfig, StarStyle,
};
use crate::consts::*;
use crate::error::{Result, StarfieldError};

/// Index of a constellation within the field (catalog order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

/// Twinkle oscillator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twinkle {
    /// Current phase in [0, TAU)
    pub phase: f32,
    /// Phase advance per tick
    pub frequency: f32,
}

impl Twinkle {
    /// Brightness multiplier in [0.4, 1.0]
    #[inline]
    pub fn level(&self) -> f32 {
        crate::twinkle_level(self.phase)
    }
}

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Decorative star or free particle, never activates
    Background,
    /// Star belonging to a constellation
    Member {
        group: GroupId,
        /// Position within the constellation definition
        index: usize,
        activated: bool,
    },
}

/// Age of a particle with a finite lifetime, in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    pub age: u32,
    pub max: u32,
}

impl Lifetime {
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age > self.max
    }

    /// Fade in over the first 20 ticks, out over the last 50
    pub fn alpha(&self) -> f32 {
        let remaining = self.max.saturating_sub(self.age) as f32 / 50.0;
        let born = self.age as f32 / 20.0;
        remaining.min(born).min(1.0)
    }
}

/// A point in the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub pos: Vec2,
    /// Present only for free particles
    pub vel: Option<Vec2>,
    pub size: f32,
    pub base_opacity: f32,
    pub twinkle: Twinkle,
    /// Proximity glow hint, owned by the resolver
    pub glow: f32,
    pub kind: EntityKind,
    /// Present only for particles that age out
    pub life: Option<Lifetime>,
}

impl Entity {
    fn fixed(pos: Vec2, style: &StarStyle, kind: EntityKind, rng: &mut Pcg32) -> Self {
        let size = style.size.sample(rng);
        let base_opacity = style.opacity.sample(rng);
        let phase = rng.random::<f32>() * TAU;
        let frequency = style.twinkle_speed.sample(rng);
        Self {
            pos,
            vel: None,
            size,
            base_opacity,
            twinkle: Twinkle { phase, frequency },
            glow: 0.0,
            kind,
            life: None,
        }
    }

    /// Free particle at `pos`, sized from the particle config
    pub(crate) fn particle(pos: Vec2, vel: Vec2, cfg: &ParticleConfig, rng: &mut Pcg32) -> Self {
        let size = cfg.size.sample(rng);
        let base_opacity = cfg.opacity.sample(rng);
        let life = cfg.lifecycle.map(|l| Lifetime {
            age: 0,
            max: l.lifetime.sample(rng).round() as u32,
        });
        Self {
            pos,
            vel: Some(vel),
            size,
            base_opacity,
            twinkle: Twinkle {
                phase: 0.0,
                frequency: 0.0,
            },
            glow: 0.0,
            kind: EntityKind::Background,
            life,
        }
    }

    /// Whether the entity moves under the stepper
    #[inline]
    pub fn is_free(&self) -> bool {
        self.vel.is_some()
    }

    #[inline]
    pub fn is_member(&self) -> bool {
        matches!(self.kind, EntityKind::Member { .. })
    }

    /// Activation flag (always false for non-members)
    #[inline]
    pub fn is_activated(&self) -> bool {
        matches!(self.kind, EntityKind::Member { activated: true, .. })
    }
}

/// A constellation instance bound to its member entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constellation {
    pub name: String,
    /// Entity indices, ordered as in the definition
    pub members: Vec<usize>,
    /// Edges as pairs of positions in `members`
    pub edges: Vec<[usize; 2]>,
    /// Timestamp (ms) of the completion currently on record
    pub completed_at: Option<f64>,
}

impl Constellation {
    /// All members activated
    pub fn is_complete(&self, entities: &[Entity]) -> bool {
        self.members.iter().all(|&i| entities[i].is_activated())
    }

    pub fn activated_count(&self, entities: &[Entity]) -> usize {
        self.members
            .iter()
            .filter(|&&i| entities[i].is_activated())
            .count()
    }

    /// Mean member position
    pub fn centroid(&self, entities: &[Entity]) -> Vec2 {
        let sum: Vec2 = self.members.iter().map(|&i| entities[i].pos).sum();
        sum / self.members.len().max(1) as f32
    }

    /// Entity index pairs for each edge
    pub fn edge_entities(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges
            .iter()
            .map(|&[a, b]| (self.members[a], self.members[b]))
    }
}

/// Complete simulation state (deterministic given config, size and seed)
#[derive(Debug, Clone)]
pub struct Field {
    pub seed: u64,
    pub width: f32,
    pub height: f32,
    /// All entities in creation order: members, background, particles
    pub entities: Vec<Entity>,
    /// Constellations in catalog order
    pub groups: Vec<Constellation>,
    pub particles: Option<ParticleConfig>,
    pub activation: ActivationConfig,
    pub focal: Option<FocalRegion>,
    /// Accretion disk orbiting the focal graphic
    pub disk: Vec<DiskParticle>,
    pub disk_config: Option<DiskConfig>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Tick of the last lifecycle respawn
    pub(crate) last_spawn_tick: u64,
    /// Press state seen by the previous tick, for burst edges
    pub(crate) was_pressed: bool,
    /// Seeded stream for drift jitter, respawns and bursts
    pub(crate) rng: Pcg32,
}

impl Field {
    /// Build a field for a surface of `width` x `height`
    pub fn initialize(config: &HeroConfig, width: f32, height: f32, seed: u64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(StarfieldError::InvalidSurface { width, height });
        }
        config.validate()?;

        let mut rng = Pcg32::seed_from_u64(seed);
        let member_total = config.catalog.star_count();
        let particle_total = config.particles.as_ref().map_or(0, |p| p.count);
        let mut entities =
            Vec::with_capacity(member_total + config.background.count + particle_total);
        let mut groups = Vec::with_capacity(config.catalog.len());

        for (g, def) in config.catalog.defs().iter().enumerate() {
            let mut members = Vec::with_capacity(def.stars.len());
            for index in 0..def.stars.len() {
                let Some(pos) = def.star_position(index, width, height) else {
                    continue;
                };
                let kind = EntityKind::Member {
                    group: GroupId(g),
                    index,
                    activated: false,
                };
                members.push(entities.len());
                entities.push(Entity::fixed(pos, &config.member_style, kind, &mut rng));
            }
            groups.push(Constellation {
                name: def.name.clone(),
                members,
                edges: def.edges.clone(),
                completed_at: None,
            });
        }

        let bg = &config.background;
        let mut fallbacks = 0usize;
        for _ in 0..bg.count {
            let (pos, placed) = place_background(&mut rng, width, height, bg.exclusion.as_ref());
            if !placed {
                fallbacks += 1;
            }
            entities.push(Entity::fixed(pos, &bg.style, EntityKind::Background, &mut rng));
        }
        if fallbacks > 0 {
            log::debug!(
                "{fallbacks} background stars placed without honoring the exclusion zone"
            );
        }

        if let Some(p) = &config.particles {
            for _ in 0..p.count {
                let pos = Vec2::new(rng.random::<f32>() * width, rng.random::<f32>() * height);
                let vel = Vec2::new(
                    (rng.random::<f32>() - 0.5) * p.initial_speed,
                    (rng.random::<f32>() - 0.5) * p.initial_speed,
                );
                entities.push(Entity::particle(pos, vel, p, &mut rng));
            }
        }

        let disk = config.disk.as_ref().map_or_else(Vec::new, |d| {
            (0..d.count).map(|_| DiskParticle::new(d, &mut rng)).collect()
        });

        log::debug!(
            "Field {width}x{height} seed {seed}: {} entities, {} constellations",
            entities.len(),
            groups.len()
        );

        Ok(Self {
            seed,
            width,
            height,
            entities,
            groups,
            particles: config.particles,
            activation: config.activation,
            focal: config.focal,
            disk,
            disk_config: config.disk,
            time_ticks: 0,
            last_spawn_tick: 0,
            was_pressed: false,
            rng,
        })
    }

    /// Surface extent as a vector
    #[inline]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn group(&self, id: GroupId) -> Option<&Constellation> {
        self.groups.get(id.0)
    }

    /// Number of activated member stars across all groups
    pub fn activated_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_activated()).count()
    }

    /// Focal graphic center and radius on this surface
    pub fn focal_disc(&self) -> Option<(Vec2, f32)> {
        self.focal.map(|f| {
            let center = Vec2::new(f.center[0] * self.width, f.center[1] * self.height);
            (center, f.radius_fraction * self.width.min(self.height))
        })
    }

    /// Where the accretion disk sits: around the focal graphic, or the
    /// surface center without one
    pub fn disk_geometry(&self) -> Option<DiskGeometry> {
        let disk = self.disk_config?;
        let short = self.width.min(self.height);
        let (center, hole_radius) = self
            .focal_disc()
            .unwrap_or((self.extent() / 2.0, 0.0));
        Some(DiskGeometry {
            center,
            half_width: disk.width * short,
            half_height: disk.height * short,
            hole_radius,
        })
    }

    /// Whether `point` lies in the clickable area around the focal graphic
    pub fn focal_contains(&self, point: Vec2) -> bool {
        match (self.focal, self.focal_disc()) {
            (Some(f), Some((center, radius))) => point.distance(center) < radius * f.hit_scale,
            _ => false,
        }
    }
}

/// Particle on a flattened circular orbit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskParticle {
    pub angle: f32,
    /// Orbit radius as a fraction of the half-axes
    pub radius: f32,
    /// Angle advance per tick; inner orbits are faster
    pub speed: f32,
    pub brightness: f32,
    /// Angular length of the trailing streak
    pub streak: f32,
    /// Vertical offset as a fraction of the half-height
    pub y_offset: f32,
}

impl DiskParticle {
    fn new(cfg: &DiskConfig, rng: &mut Pcg32) -> Self {
        let radius_norm: f32 = rng.random();
        Self {
            angle: rng.random::<f32>() * TAU,
            radius: cfg.radius.min + (cfg.radius.max - cfg.radius.min) * radius_norm,
            speed: (0.003 + rng.random::<f32>() * 0.004) * (1.0 - radius_norm * 0.5),
            brightness: 0.3 + rng.random::<f32>() * 0.7,
            streak: 0.02 + rng.random::<f32>() * 0.04,
            y_offset: (rng.random::<f32>() - 0.5) * 0.03,
        }
    }

    /// Offset from the disk center on the bare orbit at `angle`
    #[inline]
    pub fn orbit_at(&self, angle: f32, geo: &DiskGeometry) -> Vec2 {
        Vec2::new(
            angle.cos() * self.radius * geo.half_width,
            angle.sin() * self.radius * geo.half_height,
        )
    }

    /// Offset of the streak head, including the vertical jitter
    pub fn head(&self, geo: &DiskGeometry) -> Vec2 {
        self.orbit_at(self.angle, geo) + Vec2::new(0.0, self.y_offset * geo.half_height)
    }

    /// Offset of the streak tail
    pub fn tail(&self, geo: &DiskGeometry) -> Vec2 {
        self.orbit_at(self.angle - self.streak, geo)
    }

    /// Lower half of the orbit passes in front of the hole
    #[inline]
    pub fn is_front(&self) -> bool {
        self.angle.sin() <= 0.0
    }

    /// 1 on the approaching (left) side, 0 on the receding side
    #[inline]
    pub fn doppler(&self) -> f32 {
        (1.0 - self.angle.cos()) / 2.0
    }
}

/// Disk placement on the current surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskGeometry {
    pub center: Vec2,
    pub half_width: f32,
    pub half_height: f32,
    /// Radius of the hole the disk wraps around
    pub hole_radius: f32,
}

/// Pick a background position, retrying around the exclusion zone.
/// Returns false when the retries ran out and the zone was ignored.
fn place_background(
    rng: &mut Pcg32,
    width: f32,
    height: f32,
    exclusion: Option<&ExclusionZone>,
) -> (Vec2, bool) {
    let Some(zone) = exclusion else {
        return (
            Vec2::new(rng.random::<f32>() * width, rng.random::<f32>() * height),
            true,
        );
    };

    for _ in 0..MAX_PLACEMENT_RETRIES {
        let x = rng.random::<f32>() * width;
        let y = rng.random::<f32>() * height;
        if !zone.contains(x, y, width, height) {
            return (Vec2::new(x, y), true);
        }
    }

    (
        Vec2::new(rng.random::<f32>() * width, rng.random::<f32>() * height),
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackgroundConfig, Span};
    use crate::sim::constellation::{Catalog, ConstellationDef};

    fn positions(field: &Field) -> Vec<Vec2> {
        field.entities.iter().map(|e| e.pos).collect()
    }

    #[test]
    fn test_same_seed_same_field() {
        let config = HeroConfig::constellation();
        let a = Field::initialize(&config, 1280.0, 720.0, 42).unwrap();
        let b = Field::initialize(&config, 1280.0, 720.0, 42).unwrap();
        assert_eq!(a.entities, b.entities);

        let c = Field::initialize(&config, 1280.0, 720.0, 43).unwrap();
        assert_ne!(positions(&a), positions(&c));
    }

    #[test]
    fn test_creation_order_members_then_background_then_particles() {
        let mut config = HeroConfig::particle_field();
        config.catalog = Catalog::horizon();
        config.background.count = 10;
        let field = Field::initialize(&config, 800.0, 600.0, 7).unwrap();

        assert_eq!(field.entities.len(), 22 + 10 + 25);
        assert!(field.entities[..22].iter().all(Entity::is_member));
        assert!(field.entities[22..32].iter().all(|e| !e.is_member() && !e.is_free()));
        assert!(field.entities[32..].iter().all(Entity::is_free));
    }

    #[test]
    fn test_members_scaled_to_surface() {
        let config = HeroConfig::constellation();
        let field = Field::initialize(&config, 1000.0, 500.0, 1).unwrap();
        let orion = &field.groups[0];
        assert_eq!(orion.name, "Orion");
        let first = field.entities[orion.members[0]].pos;
        assert!((first - Vec2::new(480.0, 90.0)).length() < 1e-3);
        assert_eq!(field.activated_count(), 0);
        assert!(field.groups.iter().all(|g| g.completed_at.is_none()));
    }

    #[test]
    fn test_background_avoids_exclusion_zone() {
        let config = HeroConfig::black_hole();
        let field = Field::initialize(&config, 1200.0, 800.0, 99).unwrap();
        let zone = config.background.exclusion.unwrap();
        for e in field.entities.iter().filter(|e| !e.is_member()) {
            assert!(!zone.contains(e.pos.x, e.pos.y, 1200.0, 800.0));
        }
    }

    #[test]
    fn test_full_surface_exclusion_still_terminates() {
        let mut config = HeroConfig::constellation();
        config.background = BackgroundConfig {
            count: 20,
            style: config.background.style,
            exclusion: Some(ExclusionZone {
                center: [0.5, 0.5],
                half_extent: [1.0, 1.0],
            }),
        };
        let field = Field::initialize(&config, 300.0, 200.0, 5).unwrap();
        let bg: Vec<_> = field.entities.iter().filter(|e| !e.is_member()).collect();
        assert_eq!(bg.len(), 20);
        for e in bg {
            assert!((0.0..=300.0).contains(&e.pos.x));
            assert!((0.0..=200.0).contains(&e.pos.y));
        }
    }

    #[test]
    fn test_invalid_surface_rejected() {
        let config = HeroConfig::constellation();
        for (w, h) in [(0.0, 100.0), (100.0, -1.0), (f32::NAN, 100.0), (f32::INFINITY, 1.0)] {
            assert!(matches!(
                Field::initialize(&config, w, h, 0),
                Err(StarfieldError::InvalidSurface { .. })
            ));
        }
    }

    #[test]
    fn test_particle_velocity_within_initial_speed() {
        let config = HeroConfig::interactive();
        let field = Field::initialize(&config, 640.0, 480.0, 3).unwrap();
        for e in field.entities.iter().filter(|e| e.is_free()) {
            let v = e.vel.unwrap();
            assert!(v.x.abs() <= 1.0 && v.y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_disk_orbits_within_ellipse() {
        let field = Field::initialize(&HeroConfig::black_hole(), 1200.0, 800.0, 8).unwrap();
        assert_eq!(field.disk.len(), 500);
        let geo = field.disk_geometry().unwrap();
        assert_eq!(geo.center, Vec2::new(600.0, 400.0));
        assert!((geo.half_width - 440.0).abs() < 1e-3);
        assert!((geo.hole_radius - 64.0).abs() < 1e-3);

        for p in &field.disk {
            assert!((0.15..=0.65).contains(&p.radius));
            let head = p.head(&geo);
            assert!(head.x.abs() <= 0.65 * geo.half_width + 1e-3);
            assert!(head.y.abs() <= 0.665 * geo.half_height + 1e-3);
        }
        assert!(Field::initialize(&HeroConfig::constellation(), 800.0, 600.0, 8)
            .unwrap()
            .disk_geometry()
            .is_none());
    }

    #[test]
    fn test_lifetime_fades_in_and_out() {
        let young = Lifetime { age: 10, max: 300 };
        assert!((young.alpha() - 0.5).abs() < 1e-6);
        let prime = Lifetime { age: 150, max: 300 };
        assert_eq!(prime.alpha(), 1.0);
        let old = Lifetime { age: 275, max: 300 };
        assert!((old.alpha() - 0.5).abs() < 1e-6);
        assert!(!Lifetime { age: 300, max: 300 }.is_expired());
        assert!(Lifetime { age: 301, max: 300 }.is_expired());
    }

    #[test]
    fn test_focal_hit_area_scales_radius() {
        let field = Field::initialize(&HeroConfig::black_hole(), 1000.0, 500.0, 0).unwrap();
        let (center, radius) = field.focal_disc().unwrap();
        assert_eq!(center, Vec2::new(500.0, 250.0));
        assert!((radius - 40.0).abs() < 1e-4);
        assert!(field.focal_contains(center + Vec2::new(55.0, 0.0)));
        assert!(!field.focal_contains(center + Vec2::new(61.0, 0.0)));

        let plain = Field::initialize(&HeroConfig::constellation(), 1000.0, 500.0, 0).unwrap();
        assert!(!plain.focal_contains(Vec2::new(500.0, 250.0)));
    }

    #[test]
    fn test_centroid_and_edges() {
        let mut config = HeroConfig::constellation();
        config.catalog = Catalog::new(vec![ConstellationDef::new(
            "Triangle",
            &[[0.1, 0.1], [0.2, 0.1], [0.1, 0.2]],
            &[[0, 1], [1, 2]],
        )])
        .unwrap();
        config.background.count = 0;
        config.member_style.size = Span::fixed(2.0);
        let field = Field::initialize(&config, 100.0, 100.0, 0).unwrap();
        let group = &field.groups[0];
        let c = group.centroid(&field.entities);
        assert!((c.x - 13.333).abs() < 0.01 && (c.y - 13.333).abs() < 0.01);
        assert_eq!(group.edge_entities().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
        assert!(!group.is_complete(&field.entities));
    }
}
