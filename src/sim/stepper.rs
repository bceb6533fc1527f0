//! Kinematic stepper
//!
//! Advances one tick: pointer force, integration, damping, drift and
//! boundary handling for free particles, twinkle phase for everything.
//! Particles with a lifecycle age, expire, respawn and burst from the
//! pointer on press. The accretion disk turns. Constellation members and
//! background stars never move.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::state::{Entity, Field};
use crate::config::{BoundaryPolicy, ForceMode, ParticleConfig};

/// Advance the field by one tick.
///
/// `pointer` is `None` while the pointer is away from the surface.
pub fn step(field: &mut Field, pointer: Option<Vec2>, pressed: bool) {
    let extent = field.extent();
    spawn_particles(field, pointer, pressed);

    let Field {
        entities,
        particles,
        disk,
        disk_config,
        rng,
        ..
    } = field;

    for entity in entities.iter_mut() {
        entity.twinkle.phase = (entity.twinkle.phase + entity.twinkle.frequency).rem_euclid(TAU);

        let (Some(vel), Some(cfg)) = (entity.vel.as_mut(), particles.as_ref()) else {
            continue;
        };

        if let Some(p) = pointer {
            *vel += pointer_force(cfg, entity.pos, p, pressed);
        }

        entity.pos += *vel;
        *vel *= cfg.damping;

        if cfg.drift > 0.0 {
            vel.x += (rng.random::<f32>() - 0.5) * cfg.drift;
            vel.y += (rng.random::<f32>() - 0.5) * cfg.drift;
        }

        apply_boundary(cfg.boundary, &mut entity.pos, vel, extent);

        if let Some(life) = entity.life.as_mut() {
            life.age += 1;
        }
    }

    // Particles sit after every member, so member indices survive this
    entities.retain(|e| !e.life.is_some_and(|l| l.is_expired()));

    let spin = disk_config.map_or(0.0, |d| d.spin);
    for particle in disk.iter_mut() {
        particle.angle = (particle.angle + particle.speed * spin).rem_euclid(TAU);
    }

    field.time_ticks += 1;
}

/// Burst on the press edge, then top the population back up
fn spawn_particles(field: &mut Field, pointer: Option<Vec2>, pressed: bool) {
    let press_started = pressed && !field.was_pressed;
    field.was_pressed = pressed;

    let Some(cfg) = field.particles else {
        return;
    };
    let Some(life) = cfg.lifecycle else {
        return;
    };

    if let (true, Some(at)) = (press_started, pointer) {
        for _ in 0..life.burst_count {
            let vel = Vec2::new(
                (field.rng.random::<f32>() - 0.5) * life.burst_speed,
                (field.rng.random::<f32>() - 0.5) * life.burst_speed,
            );
            let particle = Entity::particle(at, vel, &cfg, &mut field.rng);
            field.entities.push(particle);
        }
    }

    let alive = field.entities.iter().filter(|e| e.is_free()).count();
    let due = field.time_ticks - field.last_spawn_tick >= u64::from(life.respawn_every);
    if alive < cfg.count && due {
        let pos = Vec2::new(
            field.rng.random::<f32>() * field.width,
            field.rng.random::<f32>() * field.height,
        );
        let vel = Vec2::new(
            (field.rng.random::<f32>() - 0.5) * cfg.initial_speed,
            (field.rng.random::<f32>() - 0.5) * cfg.initial_speed,
        );
        let particle = Entity::particle(pos, vel, &cfg, &mut field.rng);
        field.entities.push(particle);
        field.last_spawn_tick = field.time_ticks;
    }
}

/// Velocity change from the pointer on a particle at `pos`
#[inline]
fn pointer_force(cfg: &ParticleConfig, pos: Vec2, pointer: Vec2, pressed: bool) -> Vec2 {
    let delta = pointer - pos;
    let dist = delta.length();
    let magnitude = cfg.force.magnitude(dist, pressed);
    if magnitude == 0.0 {
        return Vec2::ZERO;
    }
    let toward = delta / dist;
    match cfg.force.mode {
        ForceMode::Attract => toward * magnitude,
        ForceMode::Repel => -toward * magnitude,
    }
}

/// Keep a particle inside the surface according to the policy
fn apply_boundary(policy: BoundaryPolicy, pos: &mut Vec2, vel: &mut Vec2, extent: Vec2) {
    match policy {
        BoundaryPolicy::Wrap { margin } => {
            for axis in 0..2 {
                if pos[axis] < -margin {
                    pos[axis] = extent[axis] + margin;
                } else if pos[axis] > extent[axis] + margin {
                    pos[axis] = -margin;
                }
            }
        }
        BoundaryPolicy::Reflect { restitution } => {
            for axis in 0..2 {
                if pos[axis] < 0.0 {
                    pos[axis] = 0.0;
                    vel[axis] = vel[axis].abs() * restitution;
                } else if pos[axis] > extent[axis] {
                    pos[axis] = extent[axis];
                    vel[axis] = -vel[axis].abs() * restitution;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeroConfig;

    fn particle_field(seed: u64) -> Field {
        Field::initialize(&HeroConfig::particle_field(), 400.0, 300.0, seed).unwrap()
    }

    #[test]
    fn test_fixed_stars_never_move() {
        let mut field =
            Field::initialize(&HeroConfig::constellation(), 800.0, 600.0, 11).unwrap();
        let before: Vec<_> = field.entities.iter().map(|e| e.pos).collect();
        for i in 0..200 {
            step(&mut field, Some(Vec2::new(i as f32 * 4.0, 300.0)), i % 2 == 0);
        }
        let after: Vec<_> = field.entities.iter().map(|e| e.pos).collect();
        assert_eq!(before, after);
        assert_eq!(field.time_ticks, 200);
    }

    #[test]
    fn test_twinkle_phase_wraps() {
        let mut field =
            Field::initialize(&HeroConfig::constellation(), 800.0, 600.0, 2).unwrap();
        for _ in 0..1000 {
            step(&mut field, None, false);
        }
        for e in &field.entities {
            assert!((0.0..TAU).contains(&e.twinkle.phase));
            assert!((0.4 - 1e-6..=1.0 + 1e-6).contains(&e.twinkle.level()));
        }
    }

    #[test]
    fn test_repel_pushes_particle_away() {
        let mut field = particle_field(1);
        let idx = field.entities.iter().position(|e| e.is_free()).unwrap();
        field.entities[idx].pos = Vec2::new(200.0, 150.0);
        field.entities[idx].vel = Some(Vec2::ZERO);
        if let Some(p) = field.particles.as_mut() {
            p.drift = 0.0;
        }

        step(&mut field, Some(Vec2::new(250.0, 150.0)), false);
        let vel = field.entities[idx].vel.unwrap();
        assert!(vel.x < 0.0, "repelled particle should move left, got {vel:?}");
        assert!(vel.y.abs() < 1e-6);
    }

    #[test]
    fn test_attract_pulls_harder_when_pressed() {
        let mut calm = Field::initialize(&HeroConfig::interactive(), 800.0, 600.0, 4).unwrap();
        let mut pressed = calm.clone();
        let pointer = Vec2::new(500.0, 300.0);
        for field in [&mut calm, &mut pressed] {
            field.entities[0].pos = Vec2::new(400.0, 300.0);
            field.entities[0].vel = Some(Vec2::ZERO);
        }

        step(&mut calm, Some(pointer), false);
        step(&mut pressed, Some(pointer), true);

        let calm_vx = calm.entities[0].vel.unwrap().x;
        let pressed_vx = pressed.entities[0].vel.unwrap().x;
        assert!(calm_vx > 0.0);
        assert!((pressed_vx - calm_vx * 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_away_means_no_force() {
        let mut a = particle_field(9);
        let mut b = a.clone();
        step(&mut a, None, false);
        step(&mut b, Some(Vec2::new(-10_000.0, -10_000.0)), false);
        assert_eq!(a.entities, b.entities);
    }

    #[test]
    fn test_press_bursts_once_at_pointer() {
        let mut field = Field::initialize(&HeroConfig::interactive(), 800.0, 600.0, 6).unwrap();
        let before = field.entities.len();
        let pointer = Vec2::new(400.0, 300.0);

        step(&mut field, Some(pointer), true);
        assert_eq!(field.entities.len(), before + 8);
        for e in &field.entities[before..] {
            assert_eq!(e.life.map(|l| l.age), Some(1));
            assert!(e.pos.distance(pointer) < 8.0);
        }

        step(&mut field, Some(pointer), true);
        assert_eq!(field.entities.len(), before + 8, "holding the press does not burst again");

        step(&mut field, Some(pointer), false);
        step(&mut field, None, true);
        assert_eq!(field.entities.len(), before + 8, "no burst without a pointer");
    }

    #[test]
    fn test_expired_particles_are_replaced_over_time() {
        let mut field = Field::initialize(&HeroConfig::interactive(), 800.0, 600.0, 13).unwrap();
        let count = field.particles.map_or(0, |p| p.count);
        let max_life = field.entities.iter().filter_map(|e| e.life).map(|l| l.max).max().unwrap();

        for _ in 0..=max_life {
            step(&mut field, None, false);
            assert!(field.entities.len() <= count);
        }
        assert!(field.entities.iter().all(|e| e.life.is_some_and(|l| !l.is_expired())));
        assert!(
            field.entities.iter().all(|e| e.life.is_some_and(|l| l.age < max_life)),
            "every original particle has been replaced"
        );
        assert!(!field.entities.is_empty());
    }

    #[test]
    fn test_disk_turns_and_stays_deterministic() {
        let mut a = Field::initialize(&HeroConfig::black_hole(), 1000.0, 700.0, 21).unwrap();
        let mut b = a.clone();
        let start: Vec<f32> = a.disk.iter().map(|p| p.angle).collect();

        step(&mut a, None, false);
        for (p, angle) in a.disk.iter().zip(&start) {
            let expected = (angle + p.speed).rem_euclid(TAU);
            assert!((p.angle - expected).abs() < 1e-5);
        }

        for _ in 1..500 {
            step(&mut a, Some(Vec2::new(10.0, 10.0)), false);
        }
        for _ in 0..500 {
            step(&mut b, Some(Vec2::new(10.0, 10.0)), false);
        }
        assert_eq!(a.disk, b.disk);
        assert!(a.disk.iter().all(|p| (0.0..TAU).contains(&p.angle)));
    }

    #[test]
    fn test_zero_spin_freezes_disk() {
        let mut config = HeroConfig::black_hole();
        if let Some(disk) = config.disk.as_mut() {
            disk.spin = 0.0;
        }
        let mut field = Field::initialize(&config, 1000.0, 700.0, 3).unwrap();
        let before = field.disk.clone();
        for _ in 0..50 {
            step(&mut field, None, false);
        }
        assert_eq!(field.disk, before);
    }

    #[test]
    fn test_wrap_reenters_opposite_edge() {
        let mut pos = Vec2::new(-11.0, 150.0);
        let mut vel = Vec2::new(-1.0, 0.0);
        apply_boundary(
            BoundaryPolicy::Wrap { margin: 10.0 },
            &mut pos,
            &mut vel,
            Vec2::new(400.0, 300.0),
        );
        assert_eq!(pos, Vec2::new(410.0, 150.0));
        assert_eq!(vel, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_reflect_clamps_and_bounces() {
        let mut pos = Vec2::new(405.0, -3.0);
        let mut vel = Vec2::new(2.0, -1.0);
        apply_boundary(
            BoundaryPolicy::Reflect { restitution: 0.8 },
            &mut pos,
            &mut vel,
            Vec2::new(400.0, 300.0),
        );
        assert_eq!(pos, Vec2::new(400.0, 0.0));
        assert!((vel.x + 1.6).abs() < 1e-6);
        assert!((vel.y - 0.8).abs() < 1e-6);
    }
}
