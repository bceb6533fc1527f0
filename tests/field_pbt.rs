use glam::Vec2;
use proptest::prelude::*;
use starfield::HeroConfig;
use starfield::config::BoundaryPolicy;
use starfield::sim::{Field, FieldEvent, TickInput, tick};

prop_compose! {
    fn arb_pointer()(
        x in -50.0f32..1330.0,
        y in -50.0f32..770.0,
        present in any::<bool>(),
        pressed in any::<bool>()
    ) -> (Option<Vec2>, bool) {
        (present.then_some(Vec2::new(x, y)), pressed)
    }
}

fn particle_config(boundary: BoundaryPolicy) -> HeroConfig {
    let mut config = HeroConfig::interactive();
    if let Some(particles) = config.particles.as_mut() {
        particles.boundary = boundary;
    }
    config
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_wrapped_particles_stay_within_margin(
        seed in any::<u64>(),
        margin in 0.0f32..40.0,
        trace in prop::collection::vec(arb_pointer(), 1..120)
    ) {
        let config = particle_config(BoundaryPolicy::Wrap { margin });
        let mut field = Field::initialize(&config, 1280.0, 720.0, seed).unwrap();

        for (i, (pointer, pressed)) in trace.iter().enumerate() {
            let input = TickInput { pointer: *pointer, pressed: *pressed, now_ms: i as f64 * 16.0 };
            tick(&mut field, &input);
            for e in field.entities.iter().filter(|e| e.is_free()) {
                prop_assert!(e.pos.x >= -margin && e.pos.x <= 1280.0 + margin,
                    "x {} escaped wrap margin {}", e.pos.x, margin);
                prop_assert!(e.pos.y >= -margin && e.pos.y <= 720.0 + margin,
                    "y {} escaped wrap margin {}", e.pos.y, margin);
            }
        }
    }

    #[test]
    fn test_reflected_particles_stay_on_surface(
        seed in any::<u64>(),
        restitution in 0.1f32..1.0,
        trace in prop::collection::vec(arb_pointer(), 1..120)
    ) {
        let config = particle_config(BoundaryPolicy::Reflect { restitution });
        let mut field = Field::initialize(&config, 1280.0, 720.0, seed).unwrap();

        for (i, (pointer, pressed)) in trace.iter().enumerate() {
            let input = TickInput { pointer: *pointer, pressed: *pressed, now_ms: i as f64 * 16.0 };
            tick(&mut field, &input);
            for e in field.entities.iter().filter(|e| e.is_free()) {
                prop_assert!((0.0..=1280.0).contains(&e.pos.x), "x {} off surface", e.pos.x);
                prop_assert!((0.0..=720.0).contains(&e.pos.y), "y {} off surface", e.pos.y);
                prop_assert!(e.pos.is_finite());
            }
        }
    }

    #[test]
    fn test_activation_is_monotonic_until_reset(
        seed in any::<u64>(),
        trace in prop::collection::vec(arb_pointer(), 1..200)
    ) {
        let mut config = HeroConfig::constellation();
        config.activation.reset_after_ms = 1.0e9;
        let mut field = Field::initialize(&config, 1280.0, 720.0, seed).unwrap();

        let mut previous = 0;
        for (i, (pointer, pressed)) in trace.iter().enumerate() {
            let input = TickInput { pointer: *pointer, pressed: *pressed, now_ms: i as f64 * 16.0 };
            let events = tick(&mut field, &input);
            let count = field.activated_count();
            prop_assert!(count >= previous, "activated count dropped {} -> {}", previous, count);

            let newly = events
                .iter()
                .filter(|e| matches!(e, FieldEvent::StarActivated { .. }))
                .count();
            prop_assert_eq!(count - previous, newly);
            let reset = events
                .iter()
                .any(|e| matches!(e, FieldEvent::ConstellationReset { .. }));
            prop_assert!(!reset, "no reset expected before the delay");
            previous = count;
        }
    }

    #[test]
    fn test_fixed_stars_never_move(
        seed in any::<u64>(),
        trace in prop::collection::vec(arb_pointer(), 1..60)
    ) {
        let config = HeroConfig::black_hole();
        let mut field = Field::initialize(&config, 1280.0, 720.0, seed).unwrap();
        let before: Vec<Vec2> = field.entities.iter().map(|e| e.pos).collect();

        for (i, (pointer, pressed)) in trace.iter().enumerate() {
            let input = TickInput { pointer: *pointer, pressed: *pressed, now_ms: i as f64 * 16.0 };
            tick(&mut field, &input);
        }

        for (e, pos) in field.entities.iter().zip(before) {
            if !e.is_free() {
                prop_assert_eq!(e.pos, pos);
            }
        }
    }

    #[test]
    fn test_disk_stays_on_its_ellipse(
        seed in any::<u64>(),
        ticks in 1usize..400,
        trace in prop::collection::vec(arb_pointer(), 1..20)
    ) {
        let config = HeroConfig::black_hole();
        let mut a = Field::initialize(&config, 1280.0, 720.0, seed).unwrap();
        let mut b = Field::initialize(&config, 1280.0, 720.0, seed).unwrap();
        let geo = a.disk_geometry().unwrap();

        for i in 0..ticks {
            let (pointer, pressed) = trace[i % trace.len()];
            let input = TickInput { pointer, pressed, now_ms: i as f64 * 16.0 };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }

        prop_assert_eq!(&a.disk, &b.disk);
        for p in &a.disk {
            prop_assert!((0.0..std::f32::consts::TAU).contains(&p.angle), "angle {} not wrapped", p.angle);
            let head = p.head(&geo);
            prop_assert!(head.x.abs() <= 0.65 * geo.half_width + 1e-3, "x {} outside disk", head.x);
            prop_assert!(head.y.abs() <= 0.665 * geo.half_height + 1e-3, "y {} outside disk", head.y);
        }
    }

    #[test]
    fn test_particle_population_is_bounded(
        seed in any::<u64>(),
        trace in prop::collection::vec(arb_pointer(), 1..300)
    ) {
        let config = HeroConfig::interactive();
        let (count, burst) = config
            .particles
            .and_then(|p| p.lifecycle.map(|l| (p.count, l.burst_count)))
            .unwrap();
        let mut field = Field::initialize(&config, 1280.0, 720.0, seed).unwrap();

        let mut presses = 0;
        let mut was_pressed = false;
        for (i, (pointer, pressed)) in trace.iter().enumerate() {
            if *pressed && !was_pressed && pointer.is_some() {
                presses += 1;
            }
            was_pressed = *pressed;
            let input = TickInput { pointer: *pointer, pressed: *pressed, now_ms: i as f64 * 16.0 };
            tick(&mut field, &input);

            prop_assert!(field.entities.len() <= count + presses * burst,
                "{} particles after {} presses", field.entities.len(), presses);
            for e in &field.entities {
                let life = e.life.unwrap();
                prop_assert!(!life.is_expired(), "expired particle {:?} kept", life);
            }
        }
    }
}
