use crate::{EmitterId, WhiteNoise};

/// Weighted reservoir sampling: selects one item from a stream with
/// probability proportional to a running weight, in O(1) memory.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct Reservoir<T> {
    pub sample: T,
    pub w_sum: f32,
    pub m: f32,
    pub w: f32,
}

impl<T> Reservoir<T>
where
    T: Clone + Copy,
{
    /// Streams one candidate through the reservoir; returns whether the
    /// candidate got selected.
    pub fn update(&mut self, wnoise: &mut WhiteNoise, sample: T, weight: f32) -> bool {
        self.m += 1.0;
        self.w_sum += weight;

        if wnoise.sample() * self.w_sum <= weight {
            self.sample = sample;
            true
        } else {
            false
        }
    }

    /// Merges another reservoir, re-weighted under the local target pdf;
    /// returns whether its sample got selected.
    pub fn merge(&mut self, wnoise: &mut WhiteNoise, rhs: &Self, pdf: f32) -> bool {
        if rhs.m <= 0.0 {
            return false;
        }

        self.m += rhs.m - 1.0;
        self.update(wnoise, rhs.sample, rhs.w * rhs.m * pdf)
    }

    /// Resolves the unbiased `1/pdf` estimator for the held sample; a
    /// non-positive target pdf or weight sum yields zero instead of a
    /// division fault.
    pub fn finalize(&mut self, pdf: f32) {
        let t = self.m * pdf;

        self.w = if t <= 0.0 || self.w_sum <= 0.0 {
            0.0
        } else {
            self.w_sum / t
        };
    }

    /// Caps the sample count; bounds how much confidence a merged history
    /// reservoir can carry into the future.
    pub fn clamp_m(&mut self, max: f32) {
        self.m = self.m.min(max);
    }
}

/// Finalized per-surfel sample, persisted across phases and frames.
///
/// `seed` regenerates the exact light-sample point without storing geometry;
/// `w` estimates `1/pdf` of `emitter` under the surfel's target distribution;
/// `m` is the confidence (number of candidates folded in).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfelSample {
    pub emitter: EmitterId,
    pub seed: u32,
    pub w: f32,
    pub m: f32,
}

impl SurfelSample {
    pub const EMPTY: Self = Self {
        emitter: EmitterId::NONE,
        seed: 0,
        w: 0.0,
        m: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        self.emitter.is_none() || self.m <= 0.0
    }

    /// Re-wraps this sample as a reservoir so it can be merged into another
    /// surfel's stream.
    pub fn as_reservoir(&self) -> Reservoir<Self> {
        Reservoir {
            sample: *self,
            w_sum: 0.0,
            m: self.m,
            w: self.w,
        }
    }
}

impl Default for SurfelSample {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use glam::uvec2;

    use super::*;

    fn sample(id: u32) -> SurfelSample {
        SurfelSample {
            emitter: EmitterId::new(id),
            seed: id,
            w: 1.0,
            m: 1.0,
        }
    }

    #[test]
    fn selection_is_deterministic_for_a_fixed_seed() {
        let run = || {
            let mut wnoise = WhiteNoise::new(123, uvec2(1, 2));
            let mut res = Reservoir::default();

            for id in 0..64 {
                res.update(&mut wnoise, sample(id), (id as f32).sin().abs());
            }

            res.sample
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn zero_weight_candidates_are_never_selected() {
        let mut wnoise = WhiteNoise::new(1, uvec2(0, 0));
        let mut res = Reservoir::default();

        res.update(&mut wnoise, sample(0), 1.0);

        for id in 1..100 {
            res.update(&mut wnoise, sample(id), 0.0);
        }

        assert_eq!(res.sample.emitter, EmitterId::new(0));
        assert_eq!(res.m, 100.0);
    }

    #[test]
    fn finalize_handles_degenerate_pdfs() {
        let mut res = Reservoir {
            sample: sample(0),
            w_sum: 10.0,
            m: 5.0,
            w: 0.0,
        };

        res.finalize(0.0);
        assert_eq!(res.w, 0.0);

        res.finalize(-1.0);
        assert_eq!(res.w, 0.0);

        res.w_sum = 0.0;
        res.finalize(1.0);
        assert_eq!(res.w, 0.0);

        res.w_sum = 10.0;
        res.finalize(2.0);
        assert_eq!(res.w, 1.0);
    }

    #[test]
    fn finalize_is_finite_and_non_negative() {
        let mut wnoise = WhiteNoise::new(99, uvec2(3, 4));

        for trial in 0..100u32 {
            let mut res = Reservoir::default();

            for id in 0..16 {
                let weight = ((trial * 16 + id) as f32).cos().max(0.0);

                res.update(&mut wnoise, sample(id), weight);
            }

            res.finalize(((trial as f32) - 50.0) / 25.0);

            assert!(res.w.is_finite());
            assert!(res.w >= 0.0);
        }
    }

    #[test]
    fn merge_accumulates_confidence() {
        let mut wnoise = WhiteNoise::new(5, uvec2(0, 1));
        let mut res = Reservoir::default();

        res.merge(&mut wnoise, &sample(1).as_reservoir(), 1.0);

        let rhs = Reservoir {
            sample: sample(2),
            w_sum: 0.0,
            m: 7.0,
            w: 0.5,
        };

        res.merge(&mut wnoise, &rhs, 1.0);

        assert_eq!(res.m, 8.0);

        let empty = Reservoir {
            sample: sample(3),
            w_sum: 0.0,
            m: 0.0,
            w: 0.0,
        };

        assert!(!res.merge(&mut wnoise, &empty, 1.0));
        assert_eq!(res.m, 8.0);
    }
}
