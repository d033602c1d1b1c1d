use glam::uvec2;

use crate::{
    dispatch, Emitters, Frame, Raycaster, Reservoir, SlotAllocator, SurfelId, SurfelSample,
    SurfelSurface, WhiteNoise,
};

use super::sample_lights::finalize_sample;

const PASS_SALT: u32 = 0x5eed_0005;

/// Temporal reuse: merges each surfel's previous-frame winner into this
/// frame's reservoir, with the history's confidence clamped so a stale
/// sample cannot dominate forever; one visibility test for the winner.
pub fn sample_history(
    frame: Frame,
    surfaces: &[SurfelSurface],
    allocator: &SlotAllocator,
    emitters: Emitters,
    raycaster: &impl Raycaster,
    samples: &[SurfelSample],
    history: &[SurfelSample],
    confidence_cap: f32,
) -> Vec<SurfelSample> {
    dispatch::par_map(allocator.capacity(), |idx| {
        if !allocator.is_allocated(SurfelId::new(idx)) {
            return SurfelSample::EMPTY;
        }

        let surface = surfaces[idx as usize];
        let own = samples[idx as usize];
        let mut wnoise = WhiteNoise::new(frame.seed(), uvec2(idx, PASS_SALT));
        let mut res = Reservoir::<SurfelSample>::default();

        res.merge(
            &mut wnoise,
            &own.as_reservoir(),
            emitters.target_pdf_of(&surface, &own),
        );

        let mut past = history[idx as usize].as_reservoir();

        past.clamp_m(confidence_cap);

        res.merge(
            &mut wnoise,
            &past,
            emitters.target_pdf_of(&surface, &past.sample),
        );

        finalize_sample(&surface, res, emitters, raycaster)
    })
}
