//! Hit-test and activation resolver
//!
//! Runs after the stepper each tick. Order within a tick:
//! 1. Reset pass: completed constellations past their cooldown go dark again
//! 2. Activation pass: members near the pointer light up (creation order)
//! 3. Completion pass: touched constellations that are now fully lit complete
//!
//! A constellation completes at most once until it has been reset.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityKind, Field, GroupId};
use crate::consts::*;

/// A constellation that just became fully activated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub group: GroupId,
    pub name: String,
    /// Mean member position at completion
    pub centroid: Vec2,
    /// Host timestamp (ms)
    pub timestamp: f64,
}

/// Events emitted by one resolver pass, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldEvent {
    StarActivated { entity: usize, group: GroupId },
    ConstellationCompleted(CompletionEvent),
    ConstellationReset { group: GroupId },
}

/// Apply resets, activations and completions for the current pointer
pub fn resolve(field: &mut Field, pointer: Option<Vec2>, now_ms: f64) -> Vec<FieldEvent> {
    let mut events = Vec::new();
    let reset_after = field.activation.reset_after_ms;

    for (g, group) in field.groups.iter_mut().enumerate() {
        let Some(done) = group.completed_at else {
            continue;
        };
        if now_ms - done > reset_after {
            for &i in &group.members {
                let entity = &mut field.entities[i];
                if let EntityKind::Member { activated, .. } = &mut entity.kind {
                    *activated = false;
                }
                entity.glow = 0.0;
            }
            group.completed_at = None;
            log::debug!("Constellation {} reset", group.name);
            events.push(FieldEvent::ConstellationReset { group: GroupId(g) });
        }
    }

    let radius = field.activation.radius;
    let mut touched: Vec<GroupId> = Vec::new();

    for (i, entity) in field.entities.iter_mut().enumerate() {
        let EntityKind::Member {
            group, activated, ..
        } = &mut entity.kind
        else {
            continue;
        };

        let near = pointer.is_some_and(|p| entity.pos.distance(p) < radius);

        if near && !*activated {
            *activated = true;
            events.push(FieldEvent::StarActivated {
                entity: i,
                group: *group,
            });
            if !touched.contains(group) {
                touched.push(*group);
            }
        }

        entity.glow = if near {
            (entity.glow + GLOW_RISE).min(1.0)
        } else if *activated {
            (entity.glow - GLOW_DECAY_ACTIVE).max(GLOW_FLOOR_ACTIVE)
        } else {
            (entity.glow - GLOW_DECAY_IDLE).max(0.0)
        };
    }

    for id in touched {
        let group = &mut field.groups[id.0];
        if group.completed_at.is_some() || !group.is_complete(&field.entities) {
            continue;
        }
        group.completed_at = Some(now_ms);
        let centroid = group.centroid(&field.entities);
        log::info!("Constellation {} discovered", group.name);
        events.push(FieldEvent::ConstellationCompleted(CompletionEvent {
            group: id,
            name: group.name.clone(),
            centroid,
            timestamp: now_ms,
        }));
    }

    events
}
