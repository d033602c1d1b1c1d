//! Per-frame pipeline passes, one module per dispatch.
//!
//! The engine invokes these in a fixed order (see [`crate::Engine::render()`]);
//! the ordering is a correctness requirement, not an optimization, since each
//! pass consumes the previous pass's output.

mod apply_samples;
mod debug_view;
mod despawn;
mod resolve;
mod sample_history;
mod sample_lights;
mod sample_neighbours;
mod spawn;

pub use self::apply_samples::*;
pub use self::debug_view::*;
pub use self::despawn::*;
pub use self::resolve::*;
pub use self::sample_history::*;
pub use self::sample_lights::*;
pub use self::sample_neighbours::*;
pub use self::spawn::*;
