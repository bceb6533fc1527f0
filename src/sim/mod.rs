//! Deterministic simulation module
//!
//! All field logic lives here. This module must be pure and deterministic:
//! - One tick per frame, no wall-clock reads (time is passed in)
//! - Seeded RNG only
//! - Stable iteration order (entity creation order)
//! - No rendering or platform dependencies

pub mod activation;
pub mod constellation;
pub mod state;
pub mod stepper;
pub mod tick;
pub mod warp;

pub use activation::{CompletionEvent, FieldEvent, resolve};
pub use constellation::{Catalog, ConstellationDef};
pub use state::{Constellation, Entity, EntityKind, Field, GroupId, Twinkle};
pub use stepper::step;
pub use tick::{TickInput, tick};
pub use warp::WarpTransition;
