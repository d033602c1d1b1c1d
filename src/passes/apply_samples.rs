use glam::Vec3;

use crate::{
    dispatch, Emitters, F32Ext, IrradianceAccumulator, LightsView, SlotAllocator, SurfelId,
    SurfelIrradiance, SurfelSample, SurfelSurface,
};

/// Applies the finally selected samples: re-evaluates each winner's
/// contribution scaled by its resolved `1/pdf` weight and folds it into the
/// surfel's running irradiance estimate.
///
/// Runs as two sub-dispatches: shading reads the whole pool (a surfel winner
/// needs its emitter's mean irradiance), integration then exclusively owns
/// each surfel's accumulator state.
pub fn apply_samples(
    surfaces: &[SurfelSurface],
    allocator: &SlotAllocator,
    lights: LightsView,
    accumulator: &IrradianceAccumulator,
    samples: &[SurfelSample],
    irradiance: &mut [SurfelIrradiance],
) {
    let shaded: Vec<Vec3> = {
        let emitters = Emitters::new(surfaces, irradiance, allocator, lights);

        dispatch::par_map(allocator.capacity(), |idx| {
            if !allocator.is_allocated(SurfelId::new(idx)) {
                return Vec3::ZERO;
            }

            let sample = samples[idx as usize];

            if sample.is_empty() || sample.w <= 0.0 {
                return Vec3::ZERO;
            }

            let surface = surfaces[idx as usize];
            let contribution = emitters.eval(sample.emitter, sample.seed, surface.position);
            let cos_receiver = surface.normal.dot(contribution.dir).saturate();

            contribution.radiance * cos_receiver * sample.w
        })
    };

    dispatch::par_for_each_mut(irradiance, |idx, irradiance| {
        if allocator.is_allocated(SurfelId::new(idx as u32)) {
            accumulator.integrate(irradiance, shaded[idx]);
        }
    });
}
