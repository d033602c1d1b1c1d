/// Engine tuning knobs; [`Config::default()`] suits a 1080p frame with a
/// 1k-surfel pool.
#[derive(Clone, Debug)]
pub struct Config {
    /// Surfel pool capacity; must be a non-zero multiple of 32 (one presence
    /// bit per surfel, 32 bits per bitmap word).
    pub capacity: u32,

    /// Per-cell capacity of the spatial cache; entries past it are dropped.
    pub cell_capacity: usize,

    /// A cell holding fewer surfels than this attracts spawn attempts.
    pub spawn_if_less: u32,

    /// A cell holding more surfels than this sheds random occupants.
    pub despawn_if_more: u32,

    /// Upper bound on allocations per frame; the actual per-frame budget is
    /// `min(free_slots, max_spawns_per_frame)`.
    pub max_spawns_per_frame: u32,

    /// Candidates drawn from the unified emitter population per surfel per
    /// frame during light sampling.
    pub light_candidates: u32,

    /// Neighbour reservoirs merged per surfel during spatial reuse.
    pub neighbour_candidates: u32,

    /// Neighbours whose normal cosine falls below this are not reused.
    pub normal_similarity_min: f32,

    /// Neighbours farther away than this fraction of the surfel's distance to
    /// camera are treated as lying across a depth discontinuity.
    pub depth_rejection: f32,

    /// Cap on the history reservoir's sample count during temporal reuse;
    /// bounds how long a stale sample can dominate.
    pub history_confidence_cap: f32,

    /// Radius, as a fraction of view distance, within which a surfel
    /// contributes to a pixel's resolved irradiance.
    pub affection_range: f32,

    /// Irradiance smoothing strategy.
    pub accumulation: Accumulation,
}

impl Config {
    pub(crate) fn validate(&self) {
        assert!(self.capacity > 0, "surfel pool capacity must be non-zero");
        assert_eq!(
            self.capacity % 32,
            0,
            "surfel pool capacity must be a multiple of 32",
        );
        assert!(self.cell_capacity > 0);
        assert!(self.light_candidates > 0);
        assert!(self.despawn_if_more >= self.spawn_if_less);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1024,
            cell_capacity: 256,
            spawn_if_less: 7,
            despawn_if_more: 9,
            max_spawns_per_frame: 64,
            light_candidates: 32,
            neighbour_candidates: 8,
            normal_similarity_min: 0.7,
            depth_rejection: 0.25,
            history_confidence_cap: 20.0,
            affection_range: 0.05,
            accumulation: Accumulation::default(),
        }
    }
}

/// Strategy for folding per-frame irradiance samples into a surfel's running
/// estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Accumulation {
    /// Latest sample wins; no smoothing.
    Replace,

    /// Incremental mean whose probe count saturates at `cap`, geometrically
    /// down-weighting older contributions past that point.
    RunningMean { cap: f32 },

    /// Exponential moving average with blend factor `alpha`.
    Ema { alpha: f32 },
}

impl Default for Accumulation {
    fn default() -> Self {
        Self::RunningMean { cap: 32.0 }
    }
}
