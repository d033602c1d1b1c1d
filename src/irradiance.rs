use glam::Vec3;

use crate::{Accumulation, Camera, SurfelIrradiance, SurfelSurface, Vec3Ext};

/// Folds per-frame irradiance samples into the surfels' running estimates.
#[derive(Clone, Copy, Debug)]
pub struct IrradianceAccumulator {
    strategy: Accumulation,
}

impl IrradianceAccumulator {
    pub fn new(strategy: Accumulation) -> Self {
        Self { strategy }
    }

    /// Accepts this frame's sample and advances the running estimate.
    pub fn integrate(&self, irradiance: &mut SurfelIrradiance, sample: Vec3) {
        irradiance.previous = irradiance.current;
        irradiance.current = sample;

        let luma_sqr = sample.luma() * sample.luma();

        match self.strategy {
            Accumulation::Replace => {
                irradiance.mean = sample;
                irradiance.mean_sqr = luma_sqr;
                irradiance.probes = 1.0;
            }

            Accumulation::RunningMean { cap } => {
                // Saturating the probe count turns the plain mean into a
                // geometric down-weighting of older contributions.
                irradiance.probes = (irradiance.probes + 1.0).min(cap);
                irradiance.mean += (sample - irradiance.mean) / irradiance.probes;
                irradiance.mean_sqr += (luma_sqr - irradiance.mean_sqr) / irradiance.probes;
            }

            Accumulation::Ema { alpha } => {
                if irradiance.probes == 0.0 {
                    irradiance.mean = sample;
                    irradiance.mean_sqr = luma_sqr;
                } else {
                    irradiance.mean = irradiance.mean.lerp(sample, alpha);
                    irradiance.mean_sqr += (luma_sqr - irradiance.mean_sqr) * alpha;
                }

                irradiance.probes += 1.0;
            }
        }
    }

    /// Refreshes the surfel's camera-distance field; runs as its own
    /// dispatch so the refreshed value is visible to every other surfel
    /// before the neighbour-reuse phase reads it.
    pub fn refresh_distance(
        &self,
        irradiance: &mut SurfelIrradiance,
        surface: &SurfelSurface,
        camera: &Camera,
    ) {
        irradiance.distance_to_camera = surface.position.distance(camera.position());
    }
}
