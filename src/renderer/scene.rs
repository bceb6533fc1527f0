//! Scene building
//!
//! Turns a read-only view of the field into a flat list of primitives the
//! GPU backend (or any other painter) can draw. Nothing here mutates the
//! simulation, so a frame can be rebuilt any number of times.

use glam::Vec2;

use crate::consts::*;
use crate::driver::CompletionRecord;
use crate::sim::{EntityKind, Field, WarpTransition};

/// Straight-alpha RGBA, components in [0, 1]
pub type Rgba = [f32; 4];

/// Build a color from 0-255 channels and an alpha
#[inline]
pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Rgba {
    [r / 255.0, g / 255.0, b / 255.0, a.clamp(0.0, 1.0)]
}

/// HSL (hue in degrees, saturation and lightness in [0, 1]) to RGBA
pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Rgba {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    [r + m, g + m, b + m, alpha.clamp(0.0, 1.0)]
}

/// One star or particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarSprite {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Rgba,
    /// Soft halo strength (0 = none); halo reaches `radius * 10`
    pub glow: f32,
    /// Half-length of the sparkle cross (0 = none)
    pub ray_len: f32,
    pub ray_alpha: f32,
    /// Draw a bright white center
    pub hot_core: bool,
}

/// A straight line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub color: Rgba,
    /// Fade from transparent at `from` to `color` at `to`
    pub gradient: bool,
    /// Painted over the focal disc instead of under it
    pub front: bool,
}

/// Completion caption anchored above a constellation
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub pos: Vec2,
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorGlow {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

/// Dark disc with a glowing ring (black hole, warp hole)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalDisc {
    pub center: Vec2,
    pub radius: f32,
    pub ring_alpha: f32,
    pub hovered: bool,
}

/// Everything drawn on one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub clear: Rgba,
    pub stars: Vec<StarSprite>,
    pub lines: Vec<Line>,
    pub labels: Vec<Label>,
    pub cursor: Option<CursorGlow>,
    pub focal: Option<FocalDisc>,
    /// Black overlay opacity painted last
    pub fade: f32,
}

/// Visual toggles derived from user settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStyle {
    pub labels: bool,
    pub cursor_glow: bool,
    pub star_rays: bool,
    pub star_halos: bool,
    pub particle_links: bool,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            labels: true,
            cursor_glow: true,
            star_rays: true,
            star_halos: true,
            particle_links: true,
        }
    }
}

/// Build the primitives for the current field state
pub fn build_scene(
    field: &Field,
    pointer: Option<Vec2>,
    records: &[CompletionRecord],
    now_ms: f64,
    style: &SceneStyle,
) -> Scene {
    let radius = field.activation.radius;
    let mut scene = Scene {
        clear: BACKGROUND,
        stars: Vec::with_capacity(field.entities.len()),
        ..Scene::default()
    };

    push_disk_streaks(field, &mut scene.lines);

    for group in &field.groups {
        for (a, b) in group.edge_entities() {
            let (s1, s2) = (&field.entities[a], &field.entities[b]);
            if !(s1.is_activated() && s2.is_activated()) {
                continue;
            }
            let glow = s1.glow.min(s2.glow);
            let layers = [
                (5.0, rgba(100.0, 180.0, 255.0, 0.15 + glow * 0.2)),
                (2.5, rgba(140.0, 200.0, 255.0, 0.35 + glow * 0.3)),
                (1.0, rgba(220.0, 240.0, 255.0, 0.7 + glow * 0.3)),
            ];
            for (width, color) in layers {
                scene.lines.push(Line {
                    from: s1.pos,
                    to: s2.pos,
                    width,
                    color,
                    gradient: false,
                    front: false,
                });
            }
        }
    }

    if style.particle_links {
        push_particle_links(field, &mut scene.lines);
    }

    for entity in &field.entities {
        if entity.is_free() {
            let life = entity.life.map_or(1.0, |l| l.alpha());
            scene.stars.push(StarSprite {
                pos: entity.pos,
                radius: entity.size,
                color: rgba(100.0, 200.0, 255.0, entity.base_opacity * life),
                glow: 0.0,
                ray_len: 0.0,
                ray_alpha: 0.0,
                hot_core: false,
            });
            continue;
        }

        let twinkle = entity.twinkle.level();
        let dist = pointer.map(|p| entity.pos.distance(p));
        let near = dist.is_some_and(|d| d < radius);

        let (opacity, color_rgb, hot_core) = match entity.kind {
            EntityKind::Member { activated, .. } => {
                let opacity = if near {
                    0.95
                } else if activated {
                    0.75 * twinkle
                } else {
                    entity.base_opacity * twinkle
                };
                let b = if activated { 255.0 } else { 200.0 };
                (opacity, [b, b, 255.0], activated)
            }
            EntityKind::Background => {
                let proximity = match dist {
                    Some(d) if d < radius => 1.0 - d / radius,
                    _ => 0.0,
                };
                let opacity = (entity.base_opacity + proximity * 0.5) * twinkle;
                let hue = 200.0 + (entity.twinkle.phase * 0.5).sin() * 20.0;
                (opacity, [180.0 + hue * 0.2, 210.0 + hue * 0.1, 255.0], false)
            }
        };

        let (ray_len, ray_alpha) = if style.star_rays && opacity > 0.5 {
            (entity.size * 4.0 * opacity, (opacity - 0.5) * 0.4)
        } else {
            (0.0, 0.0)
        };

        scene.stars.push(StarSprite {
            pos: entity.pos,
            radius: entity.size,
            color: rgba(color_rgb[0], color_rgb[1], color_rgb[2], opacity),
            glow: if style.star_halos { entity.glow } else { 0.0 },
            ray_len,
            ray_alpha,
            hot_core,
        });
    }

    if style.labels {
        let duration = field.activation.label_duration_ms;
        scene.labels = records
            .iter()
            .filter_map(|r| {
                let alpha = r.fade(now_ms, duration);
                (alpha > 0.0).then(|| Label {
                    text: r.name.clone(),
                    pos: r.centroid - Vec2::new(0.0, LABEL_OFFSET_Y),
                    alpha,
                })
            })
            .collect();
    }

    let hovered = pointer.is_some_and(|p| field.focal_contains(p));
    scene.focal = field.focal_disc().map(|(center, radius)| FocalDisc {
        center,
        radius,
        ring_alpha: if hovered { 0.6 } else { 0.4 },
        hovered,
    });

    if style.cursor_glow {
        scene.cursor = pointer.map(|pos| CursorGlow {
            pos,
            radius,
            color: rgba(100.0, 180.0, 255.0, 0.02),
        });
    }

    scene
}

/// Accretion disk streaks. The upper half of each orbit passes behind the
/// hole and is culled closer to it; the lower half is drawn over it.
fn push_disk_streaks(field: &Field, lines: &mut Vec<Line>) {
    let Some(geo) = field.disk_geometry() else {
        return;
    };

    for p in &field.disk {
        let head = p.head(&geo);
        let base_y = p.orbit_at(p.angle, &geo).y;
        let doppler = p.doppler();
        let b = p.brightness;

        let line = if p.is_front() {
            if head.length() <= geo.hole_radius * 0.7 {
                continue;
            }
            let lightness = (50.0 + b * 30.0 + doppler * 20.0).min(100.0) / 100.0;
            Line {
                from: geo.center + p.tail(&geo),
                to: geo.center + head,
                width: 2.5 + b * 3.0,
                color: hsla(20.0 + doppler * 25.0, 1.0, lightness, b * 0.7),
                gradient: true,
                front: true,
            }
        } else {
            if head.length() <= geo.hole_radius * 0.9 {
                continue;
            }
            let lightness = (45.0 + b * 25.0 + doppler * 15.0).min(100.0) / 100.0;
            let alpha = b * 0.4 * (1.0 - base_y.abs() / (geo.half_height * 0.8)).max(0.0);
            Line {
                from: geo.center + p.tail(&geo),
                to: geo.center + head,
                width: 2.0 + b * 2.0,
                color: hsla(25.0 + doppler * 20.0, 1.0, lightness, alpha),
                gradient: true,
                front: false,
            }
        };
        lines.push(line);
    }
}

/// Mesh lines between free particles closer than the link distance
fn push_particle_links(field: &Field, lines: &mut Vec<Line>) {
    let Some(max_dist) = field.particles.as_ref().and_then(|p| p.link_distance) else {
        return;
    };
    let particles: Vec<Vec2> = field
        .entities
        .iter()
        .filter(|e| e.is_free())
        .map(|e| e.pos)
        .collect();

    for (i, &a) in particles.iter().enumerate() {
        for &b in &particles[..i] {
            let d = a.distance(b);
            if d < max_dist {
                lines.push(Line {
                    from: a,
                    to: b,
                    width: 1.0,
                    color: rgba(100.0, 200.0, 255.0, (1.0 - d / max_dist) * 0.2),
                    gradient: false,
                    front: false,
                });
            }
        }
    }
}

/// Build the primitives for one warp frame
pub fn build_warp_scene(warp: &WarpTransition) -> Scene {
    let lines = warp
        .segments()
        .map(|s| Line {
            from: s.tail,
            to: s.head,
            width: s.width,
            color: hsla(s.hue, 1.0, 0.85, s.alpha),
            gradient: true,
            front: false,
        })
        .collect();

    Scene {
        clear: BACKGROUND,
        stars: Vec::new(),
        lines,
        labels: Vec::new(),
        cursor: None,
        focal: Some(FocalDisc {
            center: warp.center(),
            radius: warp.hole_radius(),
            ring_alpha: warp.ring_alpha(),
            hovered: false,
        }),
        fade: warp.fade_alpha(),
    }
}
