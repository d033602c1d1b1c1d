use std::sync::atomic::{AtomicU32, Ordering};

use glam::uvec2;

use crate::{dispatch, Camera, Frame, SlotAllocator, SpatialCache, SurfelId, SurfelSurface, WhiteNoise};

const PASS_SALT: u32 = 0x5eed_0002;

/// Despawns surfels whose position has left the view frustum.
pub fn despawn_frustum(
    camera: &Camera,
    surfaces: &[SurfelSurface],
    allocator: &SlotAllocator,
) {
    dispatch::par_for(allocator.capacity(), |idx| {
        let id = SurfelId::new(idx);

        if !allocator.is_allocated(id) {
            return;
        }

        if camera.world_to_ndc(surfaces[idx as usize].position).is_none() {
            allocator.deallocate(id);
        }
    });
}

/// Despawns random occupants of over-dense cells until each narrow-kernel
/// cell holds at most `despawn_if_more` surfels.
///
/// Each cell is owned by one invocation, so the swap-with-last removal never
/// contends; only the slot deallocations go through atomics.
pub fn despawn_high_density(
    frame: Frame,
    cache: &mut SpatialCache,
    allocator: &SlotAllocator,
    despawn_if_more: u32,
) {
    dispatch::par_for_each_mut(cache.cells_mut(), |cell_idx, cell| {
        if cell.len() <= despawn_if_more as usize {
            return;
        }

        let mut wnoise = WhiteNoise::new(frame.seed(), uvec2(cell_idx as u32, PASS_SALT));

        while cell.len() > despawn_if_more as usize {
            let victim = (wnoise.sample_int() as usize) % cell.len();
            let id = cell.swap_remove(victim);

            allocator.deallocate(SurfelId::new(id));
        }
    });
}

/// Despawns surfels that contributed to no pixel since the previous pass;
/// resets every usage counter to zero regardless of the despawn decision.
pub fn despawn_low_usage(allocator: &SlotAllocator, usage: &[AtomicU32]) {
    dispatch::par_for(allocator.capacity(), |idx| {
        let id = SurfelId::new(idx);
        let count = usage[idx as usize].swap(0, Ordering::AcqRel);

        if allocator.is_allocated(id) && count == 0 {
            allocator.deallocate(id);
        }
    });
}
