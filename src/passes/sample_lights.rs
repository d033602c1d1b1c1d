use glam::uvec2;

use crate::{
    dispatch, Emitters, Frame, Ray, Raycaster, Reservoir, SlotAllocator, SurfelId,
    SurfelSample, SurfelSurface, WhiteNoise,
};

const PASS_SALT: u32 = 0x5eed_0003;

/// Light sampling: draws `candidates` emitters uniformly from the unified
/// population per surfel, streams them through weighted reservoir sampling
/// under the surfel's local target distribution, and pays for one occlusion
/// ray for the held winner only (resampled importance sampling).
pub fn sample_lights(
    frame: Frame,
    surfaces: &[SurfelSurface],
    allocator: &SlotAllocator,
    emitters: Emitters,
    raycaster: &impl Raycaster,
    candidates: u32,
) -> Vec<SurfelSample> {
    let population = emitters.len() as f32;

    dispatch::par_map(allocator.capacity(), |idx| {
        if !allocator.is_allocated(SurfelId::new(idx)) {
            return SurfelSample::EMPTY;
        }

        let surface = surfaces[idx as usize];
        let mut wnoise = WhiteNoise::new(frame.seed(), uvec2(idx, PASS_SALT));
        let mut res = Reservoir::<SurfelSample>::default();

        for _ in 0..candidates {
            let emitter = emitters.pick(&mut wnoise);
            let seed = wnoise.sample_int();
            let contribution = emitters.eval(emitter, seed, surface.position);
            let p_hat = emitters.target_pdf(&surface, &contribution);

            // Resampling weight: target over proposal, where the proposal is
            // the uniform emitter pick times the emitter's own sampling pdf.
            let weight = if contribution.pdf > 0.0 {
                p_hat * population / contribution.pdf
            } else {
                0.0
            };

            res.update(
                &mut wnoise,
                SurfelSample {
                    emitter,
                    seed,
                    w: 0.0,
                    m: 1.0,
                },
                weight,
            );
        }

        finalize_sample(&surface, res, emitters, raycaster)
    })
}

/// Resolves a reservoir into a persisted sample: finalizes the RIS weight
/// under the held candidate's target pdf and zeroes it if the single
/// visibility test fails.
pub(super) fn finalize_sample(
    surface: &SurfelSurface,
    mut res: Reservoir<SurfelSample>,
    emitters: Emitters,
    raycaster: &impl Raycaster,
) -> SurfelSample {
    let held = res.sample;

    if held.is_empty() && res.w_sum <= 0.0 {
        return SurfelSample::EMPTY;
    }

    let contribution = emitters.eval(held.emitter, held.seed, surface.position);
    let p_hat = emitters.target_pdf(surface, &contribution);

    res.finalize(p_hat);

    if res.w > 0.0 {
        let ray = Ray::shadow(surface.position, surface.normal, contribution.dir);
        let max_distance = (contribution.distance - Ray::NUDGE_OFFSET).max(0.0);

        if raycaster.occluded(ray, max_distance) {
            res.w = 0.0;
        }
    }

    SurfelSample {
        emitter: held.emitter,
        seed: held.seed,
        w: res.w,
        m: res.m,
    }
}
