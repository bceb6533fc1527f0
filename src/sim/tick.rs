//! Simulation tick
//!
//! One tick per rendered frame: stepper, then resolver.

use glam::Vec2;

use super::activation::{FieldEvent, resolve};
use super::state::Field;
use super::stepper::step;

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Pointer position in surface coordinates, `None` when away
    pub pointer: Option<Vec2>,
    /// Pointer button or touch held down
    pub pressed: bool,
    /// Host timestamp in milliseconds
    pub now_ms: f64,
}

/// Advance the field by one tick and return the resolver's events
pub fn tick(field: &mut Field, input: &TickInput) -> Vec<FieldEvent> {
    step(field, input.pointer, input.pressed);
    resolve(field, input.pointer, input.now_ms)
}
