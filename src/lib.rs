//! Real-time surfel-based global illumination estimator.
//!
//! A fixed-capacity cloud of surface probes ("surfels") is kept in sync with
//! the visible scene and refreshed every frame: a screen-space spatial cache
//! indexes the live probes, a density controller spawns and despawns them
//! under a per-frame budget, and a four-phase weighted-reservoir sampler
//! picks one effective light per surfel per frame, reusing samples across
//! neighbouring surfels and across frames. The resolved probe irradiance is
//! gathered into a per-pixel diffuse image.
//!
//! Passes are dispatched as parallel-for loops over known index ranges and
//! are strictly sequenced by [`Engine::render()`]; within a pass, shared
//! state is touched only through atomics.

mod allocator;
mod cache;
mod camera;
mod config;
mod dispatch;
mod emitter;
mod engine;
mod frame;
mod gbuffer;
mod irradiance;
mod light;
mod noise;
mod normal;
mod passes;
mod ray;
mod reservoir;
mod surfel;
mod utils;

pub use self::allocator::*;
pub use self::cache::*;
pub use self::camera::*;
pub use self::config::*;
pub use self::dispatch::*;
pub use self::emitter::*;
pub use self::engine::*;
pub use self::frame::*;
pub use self::gbuffer::*;
pub use self::irradiance::*;
pub use self::light::*;
pub use self::noise::*;
pub use self::normal::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::reservoir::*;
pub use self::surfel::*;
pub use self::utils::*;

/// Side length of the screen-space cache grid; the screen is split into
/// `GRID_SIZE * GRID_SIZE` cells over normalized device coordinates.
pub const GRID_SIZE: usize = 16;

/// Smallest squared-distance considered distinct from zero; used to guard
/// inverse-square falloffs.
pub const EPSILON: f32 = 1e-4;
