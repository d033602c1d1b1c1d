use std::sync::atomic::AtomicU32;

use glam::Vec4;

use crate::{
    dispatch, passes, AllocationContext, CacheKernel, Camera, Config, Emitters, Frame,
    GBufferView, IrradianceAccumulator, Light, LightsView, Raycaster, SlotAllocator,
    SpatialCache, SurfelIrradiance, SurfelSample, SurfelSurface, GRID_SIZE,
};

/// The surfel pipeline: owns the pool and all per-frame state, and sequences
/// the passes.
pub struct Engine {
    config: Config,
    accumulator: IrradianceAccumulator,
    allocator: SlotAllocator,
    surfaces: Vec<SurfelSurface>,
    irradiance: Vec<SurfelIrradiance>,
    cache_narrow: SpatialCache,
    cache_wide: SpatialCache,
    usage: Vec<AtomicU32>,
    history: Vec<SurfelSample>,
    output: Vec<Vec4>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        config.validate();

        log::info!(
            "Initializing surfel engine (capacity={}, grid={GRID_SIZE}x{GRID_SIZE})",
            config.capacity,
        );

        let capacity = config.capacity as usize;

        Self {
            accumulator: IrradianceAccumulator::new(config.accumulation),
            allocator: SlotAllocator::new(config.capacity),
            surfaces: vec![SurfelSurface::default(); capacity],
            irradiance: vec![SurfelIrradiance::default(); capacity],
            cache_narrow: SpatialCache::new(config.cell_capacity),
            cache_wide: SpatialCache::new(config.cell_capacity),
            usage: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            history: vec![SurfelSample::EMPTY; capacity],
            output: Vec::new(),
            config,
        }
    }

    /// Advances the pipeline by one frame and returns the resolved per-pixel
    /// diffuse irradiance image.
    ///
    /// The pass order below is a hard correctness requirement: every pass
    /// consumes the previous pass's output, and the two in-frame barriers
    /// (the allocation budget before spawning, the camera-distance refresh
    /// before neighbour reuse) fall out of the dispatch boundaries.
    pub fn render(
        &mut self,
        frame: Frame,
        camera: &Camera,
        gbuffer: GBufferView,
        lights: &[Light],
        raycaster: &impl Raycaster,
    ) -> &[Vec4] {
        assert_eq!(gbuffer.size(), camera.screen_size());

        let lights = LightsView::new(lights);

        self.cache_narrow
            .rebuild(CacheKernel::Narrow, camera, &self.surfaces, &self.allocator);

        passes::despawn_frustum(camera, &self.surfaces, &self.allocator);

        passes::despawn_high_density(
            frame,
            &mut self.cache_narrow,
            &self.allocator,
            self.config.despawn_if_more,
        );

        passes::despawn_low_usage(&self.allocator, &self.usage);

        // The budget is established once, before any spawn attempt runs
        let budget = AllocationContext::new(&self.allocator, self.config.max_spawns_per_frame);

        let spawned = passes::spawn(
            frame,
            camera,
            gbuffer,
            &self.cache_narrow,
            &self.allocator,
            &budget,
            self.config.spawn_if_less,
        );

        for spawn in spawned {
            let idx = spawn.id.get() as usize;

            self.surfaces[idx] = spawn.surface;
            self.irradiance[idx] = SurfelIrradiance::default();
            self.history[idx] = SurfelSample::EMPTY;
        }

        // The wide cache picks up this frame's spawns
        self.cache_wide
            .rebuild(CacheKernel::Wide, camera, &self.surfaces, &self.allocator);

        // Camera distances must be published before neighbour reuse reads
        // other surfels' distances
        {
            let surfaces = &self.surfaces;
            let accumulator = &self.accumulator;

            dispatch::par_for_each_mut(&mut self.irradiance, |idx, irradiance| {
                accumulator.refresh_distance(irradiance, &surfaces[idx], camera);
            });
        }

        let samples = {
            let emitters =
                Emitters::new(&self.surfaces, &self.irradiance, &self.allocator, lights);

            let samples = passes::sample_lights(
                frame,
                &self.surfaces,
                &self.allocator,
                emitters,
                raycaster,
                self.config.light_candidates,
            );

            let samples = passes::sample_neighbours(
                frame,
                camera,
                &self.config,
                &self.surfaces,
                &self.irradiance,
                &self.allocator,
                &self.cache_wide,
                emitters,
                raycaster,
                &samples,
            );

            passes::sample_history(
                frame,
                &self.surfaces,
                &self.allocator,
                emitters,
                raycaster,
                &samples,
                &self.history,
                self.config.history_confidence_cap,
            )
        };

        passes::apply_samples(
            &self.surfaces,
            &self.allocator,
            lights,
            &self.accumulator,
            &samples,
            &mut self.irradiance,
        );

        self.history = samples;

        self.output = passes::resolve(
            camera,
            gbuffer,
            &self.cache_wide,
            &self.surfaces,
            &self.irradiance,
            &self.allocator,
            &self.usage,
            self.config.affection_range,
        );

        log::debug!(
            "frame={} live={} free={}",
            frame.get(),
            self.allocator.live(),
            self.allocator.free(),
        );

        &self.output
    }

    /// Renders the surfel-coverage debug image for the last frame's state.
    pub fn debug_view(&self, camera: &Camera, gbuffer: GBufferView) -> Vec<Vec4> {
        passes::debug_view(camera, gbuffer, &self.cache_wide, &self.surfaces, &self.allocator)
    }

    /// The image resolved by the most recent [`Self::render()`] call.
    pub fn diffuse(&self) -> &[Vec4] {
        &self.output
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn allocator(&self) -> &SlotAllocator {
        &self.allocator
    }

    pub fn surfaces(&self) -> &[SurfelSurface] {
        &self.surfaces
    }

    pub fn irradiance(&self) -> &[SurfelIrradiance] {
        &self.irradiance
    }
}
