use core::f32::consts::PI;

use glam::Vec3;

use crate::{
    F32Ext, LightId, LightsView, SlotAllocator, SurfelId, SurfelIrradiance, SurfelSample,
    SurfelSurface, Vec3Ext, WhiteNoise, EPSILON,
};

/// Identifier into the unified light population: ids below the surfel pool
/// capacity address surfels acting as virtual area lights; ids at or above it
/// address real scene light sources.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EmitterId(u32);

impl EmitterId {
    pub const NONE: Self = Self(u32::MAX);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn from_surfel(id: SurfelId) -> Self {
        Self(id.get())
    }

    pub fn from_light(id: LightId, capacity: u32) -> Self {
        Self(capacity + id.get())
    }

    pub fn as_surfel(self, capacity: u32) -> Option<SurfelId> {
        (self.0 < capacity).then(|| SurfelId::new(self.0))
    }

    pub fn as_light(self, capacity: u32) -> Option<LightId> {
        (!self.is_none() && self.0 >= capacity).then(|| LightId::new(self.0 - capacity))
    }
}

/// Directional radiance arriving from an emitter at a receiving point.
///
/// `radiance` folds in the emitter-side cosine and inverse-square falloff;
/// the receiver-side cosine and the sampling pdf stay separate.
#[derive(Clone, Copy, Default, Debug)]
pub struct EmitterContribution {
    pub dir: Vec3,
    pub distance: f32,
    pub radiance: Vec3,
    pub pdf: f32,
}

/// Borrowed view over the unified light population: the surfel pool plus the
/// scene light list.
#[derive(Clone, Copy)]
pub struct Emitters<'a> {
    surfaces: &'a [SurfelSurface],
    irradiance: &'a [SurfelIrradiance],
    allocator: &'a SlotAllocator,
    lights: LightsView<'a>,
}

impl<'a> Emitters<'a> {
    pub fn new(
        surfaces: &'a [SurfelSurface],
        irradiance: &'a [SurfelIrradiance],
        allocator: &'a SlotAllocator,
        lights: LightsView<'a>,
    ) -> Self {
        Self {
            surfaces,
            irradiance,
            allocator,
            lights,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.allocator.capacity()
    }

    /// Size of the unified population; the uniform proposal pdf is its
    /// reciprocal.
    pub fn len(&self) -> u32 {
        self.capacity() + self.lights.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draws an emitter uniformly from the population.
    pub fn pick(&self, wnoise: &mut WhiteNoise) -> EmitterId {
        EmitterId::new(wnoise.sample_int() % self.len())
    }

    /// Evaluates the radiance `emitter` sends towards `at`, regenerating the
    /// light-sample point from `seed`.
    ///
    /// Returns a zero-pdf contribution for dead surfels, back-facing
    /// emitters, and degenerate geometry; callers fold that into a zero
    /// resampling weight rather than special-casing.
    pub fn eval(&self, emitter: EmitterId, seed: u32, at: Vec3) -> EmitterContribution {
        if emitter.is_none() {
            return Default::default();
        }

        if let Some(id) = emitter.as_surfel(self.capacity()) {
            return self.eval_surfel(id, at);
        }

        if let Some(id) = emitter.as_light(self.capacity()) {
            if id.get() as usize >= self.lights.len() {
                return Default::default();
            }

            let sample = self
                .lights
                .get(id)
                .sample(at, &mut WhiteNoise::from_state(seed));

            return EmitterContribution {
                dir: sample.dir,
                distance: sample.distance,
                radiance: sample.radiance,
                pdf: sample.pdf,
            };
        }

        Default::default()
    }

    /// A surfel re-emits its accumulated mean irradiance diffusely; treating
    /// it as a point emitter makes nearby surfels exchange indirect light.
    fn eval_surfel(&self, id: SurfelId, at: Vec3) -> EmitterContribution {
        if !self.allocator.is_allocated(id) {
            return Default::default();
        }

        let surface = self.surfaces[id.get() as usize];
        let to_surfel = surface.position - at;
        let distance_sqr = to_surfel.length_squared();

        // A surfel at the receiving point is the receiver itself; the
        // back-facing cosine below keeps coplanar neighbours from
        // re-illuminating each other head-on.
        if distance_sqr <= EPSILON {
            return Default::default();
        }

        let distance = distance_sqr.sqrt();
        let dir = to_surfel / distance;
        let cos_emitter = surface.normal.dot(-dir).saturate();
        let radiosity = self.irradiance[id.get() as usize].mean * surface.albedo / PI;

        EmitterContribution {
            dir,
            distance,
            radiance: radiosity * cos_emitter / distance_sqr,
            pdf: 1.0,
        }
    }

    /// Scalar importance target: perceptual luminance of the diffusely
    /// shaded contribution, evaluated without an occlusion test.
    pub fn target_pdf(&self, surface: &SurfelSurface, contribution: &EmitterContribution) -> f32 {
        if contribution.pdf <= 0.0 {
            return 0.0;
        }

        let cos_receiver = surface.normal.dot(contribution.dir).saturate();
        let shaded = surface.albedo / PI * contribution.radiance * cos_receiver;

        shaded.perc_luma()
    }

    /// Re-evaluates a stored sample under `surface`'s local target
    /// distribution; used when reusing a neighbour's or the history sample.
    pub fn target_pdf_of(&self, surface: &SurfelSurface, sample: &SurfelSample) -> f32 {
        if sample.is_empty() {
            return 0.0;
        }

        let contribution = self.eval(sample.emitter, sample.seed, surface.position);

        self.target_pdf(surface, &contribution)
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3};

    use super::*;
    use crate::Light;

    #[test]
    fn id_space_is_partitioned() {
        let surfel = EmitterId::new(10);
        let light = EmitterId::new(1024 + 3);

        assert_eq!(surfel.as_surfel(1024), Some(SurfelId::new(10)));
        assert_eq!(surfel.as_light(1024), None);
        assert_eq!(light.as_surfel(1024), None);
        assert_eq!(light.as_light(1024), Some(LightId::new(3)));
        assert_eq!(EmitterId::NONE.as_surfel(1024), None);
        assert!(EmitterId::NONE.as_light(1024).is_none());
    }

    #[test]
    fn dead_surfel_contributes_nothing() {
        let allocator = SlotAllocator::new(32);
        let surfaces = vec![SurfelSurface::default(); 32];
        let irradiance = vec![SurfelIrradiance::default(); 32];
        let lights = [];
        let emitters = Emitters::new(
            &surfaces,
            &irradiance,
            &allocator,
            LightsView::new(&lights),
        );

        let contribution = emitters.eval(EmitterId::new(5), 0, vec3(1.0, 0.0, 0.0));

        assert_eq!(contribution.pdf, 0.0);
    }

    #[test]
    fn backfacing_surfel_is_suppressed() {
        let allocator = SlotAllocator::new(32);
        let id = allocator.allocate().unwrap();

        let mut surfaces = vec![SurfelSurface::default(); 32];
        let mut irradiance = vec![SurfelIrradiance::default(); 32];

        surfaces[id.get() as usize] = SurfelSurface {
            position: vec3(0.0, 1.0, 0.0),
            normal: vec3(0.0, 1.0, 0.0),
            albedo: vec3(0.5, 0.5, 0.5),
        };

        irradiance[id.get() as usize].mean = Vec3::ONE;

        let lights = [];
        let emitters = Emitters::new(
            &surfaces,
            &irradiance,
            &allocator,
            LightsView::new(&lights),
        );

        // Receiver sits above the surfel, on its front side
        let front = emitters.eval(EmitterId::from_surfel(id), 0, vec3(0.0, 2.0, 0.0));

        assert!(front.radiance.luma() > 0.0);

        // ..and below it, behind its surface
        let back = emitters.eval(EmitterId::from_surfel(id), 0, vec3(0.0, 0.0, 0.0));

        assert_eq!(back.radiance, Vec3::ZERO);
    }

    #[test]
    fn seed_regenerates_the_same_light_point() {
        let allocator = SlotAllocator::new(32);
        let surfaces = vec![SurfelSurface::default(); 32];
        let irradiance = vec![SurfelIrradiance::default(); 32];
        let lights = [Light::emissive(
            vec3(-1.0, 3.0, -1.0),
            vec3(1.0, 3.0, -1.0),
            vec3(0.0, 3.0, 1.0),
            Vec3::splat(10.0),
        )];

        let emitters = Emitters::new(
            &surfaces,
            &irradiance,
            &allocator,
            LightsView::new(&lights),
        );

        let emitter = EmitterId::from_light(LightId::new(0), 32);
        let seed = WhiteNoise::new(7, uvec2(1, 1)).state();

        let a = emitters.eval(emitter, seed, Vec3::ZERO);
        let b = emitters.eval(emitter, seed, Vec3::ZERO);

        assert_eq!(a.radiance, b.radiance);
        assert_eq!(a.dir, b.dir);
    }
}
