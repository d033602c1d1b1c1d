use glam::uvec2;

use crate::{
    dispatch, Camera, Config, Emitters, Frame, Raycaster, Reservoir, SlotAllocator,
    SpatialCache, SurfelId, SurfelIrradiance, SurfelSample, SurfelSurface, WhiteNoise,
    EPSILON,
};

use super::sample_lights::finalize_sample;

const PASS_SALT: u32 = 0x5eed_0004;

/// Spatial reuse: merges samples already selected by nearby surfels (drawn
/// from the wide-kernel cache cell) into each surfel's reservoir,
/// re-weighted under the local target distribution, with one visibility test
/// for the merged winner.
///
/// Neighbours across a normal or depth discontinuity are rejected, since
/// their samples follow a different local light field.
#[allow(clippy::too_many_arguments)]
pub fn sample_neighbours(
    frame: Frame,
    camera: &Camera,
    config: &Config,
    surfaces: &[SurfelSurface],
    irradiance: &[SurfelIrradiance],
    allocator: &SlotAllocator,
    cache: &SpatialCache,
    emitters: Emitters,
    raycaster: &impl Raycaster,
    samples: &[SurfelSample],
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

        let Some(ndc) = camera.world_to_ndc(surface.position) else {
            // Left the frustum after the despawn pass ran; nothing to reuse.
            return own;
        };

        let cell = cache.cell(camera.ndc_to_cell(ndc.truncate()));

        if !cell.is_empty() {
            let own_distance = irradiance[idx as usize].distance_to_camera.max(EPSILON);

            for _ in 0..config.neighbour_candidates {
                let pick = cell.ids()[(wnoise.sample_int() as usize) % cell.len()];

                if pick == idx || !allocator.is_allocated(SurfelId::new(pick)) {
                    continue;
                }

                let neighbour = surfaces[pick as usize];

                if surface.normal.dot(neighbour.normal) < config.normal_similarity_min {
                    continue;
                }

                let offset = neighbour.position.distance(surface.position);

                if offset / own_distance > config.depth_rejection {
                    continue;
                }

                let sample = samples[pick as usize];

                res.merge(
                    &mut wnoise,
                    &sample.as_reservoir(),
                    emitters.target_pdf_of(&surface, &sample),
                );
            }
        }

        finalize_sample(&surface, res, emitters, raycaster)
    })
}
