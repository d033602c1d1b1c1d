use glam::uvec2;

use crate::{
    dispatch, idx_to_cell, AllocationContext, Camera, Frame, GBufferView, SlotAllocator,
    SpatialCache, SurfelId, SurfelSurface, WhiteNoise, GRID_SIZE,
};

const PASS_SALT: u32 = 0x5eed_0001;

/// A freshly allocated surfel together with its surface snapshot; the engine
/// commits these into the pool once the dispatch has finished.
pub struct SpawnedSurfel {
    pub id: SurfelId,
    pub surface: SurfelSurface,
}

/// Spawns surfels in under-populated cells.
///
/// Each cell attempts up to `spawn_if_less - count` random sub-cell probes;
/// a background miss is skipped without consuming budget, while a hit
/// consumes one budget unit and allocates a slot. Once the shared budget is
/// exhausted, spawning aborts for the frame.
pub fn spawn(
    frame: Frame,
    camera: &Camera,
    gbuffer: GBufferView,
    cache: &SpatialCache,
    allocator: &SlotAllocator,
    budget: &AllocationContext,
    spawn_if_less: u32,
) -> Vec<SpawnedSurfel> {
    let cells = (GRID_SIZE * GRID_SIZE) as u32;

    let spawned = dispatch::par_map(cells, |cell_idx| {
        let cell_pos = idx_to_cell(cell_idx as usize);
        let count = cache.cell(cell_pos).len() as u32;
        let mut out = Vec::new();

        if count >= spawn_if_less {
            return out;
        }

        let mut wnoise = WhiteNoise::new(frame.seed(), uvec2(cell_idx, PASS_SALT));

        for _ in 0..(spawn_if_less - count) {
            let screen_pos = camera.cell_to_screen(cell_pos, wnoise.sample_square());
            let entry = gbuffer.get(screen_pos);

            if entry.is_none() {
                continue;
            }

            if !budget.try_take() {
                break;
            }

            let Some(id) = allocator.allocate() else {
                break;
            };

            out.push(SpawnedSurfel {
                id,
                surface: SurfelSurface {
                    position: camera.reconstruct_position(screen_pos, entry.depth),
                    normal: entry.normal,
                    albedo: entry.albedo,
                },
            });
        }

        out
    });

    spawned.into_iter().flatten().collect()
}
