use glam::UVec2;

use crate::{
    cell_to_idx, dispatch, idx_to_cell, Camera, SlotAllocator, SurfelSurface, GRID_SIZE,
};

/// Spatial kernel the cache was built with.
///
/// The narrow kernel indexes each surfel into exactly its home cell and
/// drives density decisions; the wide kernel dilates membership to the 5x5
/// cell neighborhood and drives neighbour reuse and the per-pixel resolve.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CacheKernel {
    Narrow,
    Wide,
}

impl CacheKernel {
    fn radius(self) -> i32 {
        match self {
            Self::Narrow => 0,
            Self::Wide => 2,
        }
    }
}

/// Fixed-capacity list of surfel ids inside one grid cell.
///
/// Written exclusively by its single owning rebuild invocation; entries past
/// the capacity are silently dropped.
#[derive(Clone, Default)]
pub struct CacheCell {
    ids: Vec<u32>,
    capacity: usize,
}

impl CacheCell {
    fn new(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn push(&mut self, id: u32) {
        if self.ids.len() < self.capacity {
            self.ids.push(id);
        }
    }

    /// Removes the entry at `idx` by swapping the last entry into its place.
    pub fn swap_remove(&mut self, idx: usize) -> u32 {
        self.ids.swap_remove(idx)
    }

    fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Screen-space grid index over the live surfels.
///
/// Rebuilt at the start of every frame and read-only afterwards; each cell is
/// owned by exactly one rebuild invocation, so cells never contend.
pub struct SpatialCache {
    cells: Vec<CacheCell>,
}

impl SpatialCache {
    pub fn new(cell_capacity: usize) -> Self {
        Self {
            cells: vec![CacheCell::new(cell_capacity); GRID_SIZE * GRID_SIZE],
        }
    }

    /// Rebuilds the index: every cell scans the entire pool and keeps the
    /// live surfels whose projected position falls within its kernel.
    pub fn rebuild(
        &mut self,
        kernel: CacheKernel,
        camera: &Camera,
        surfaces: &[SurfelSurface],
        allocator: &SlotAllocator,
    ) {
        let radius = kernel.radius();

        dispatch::par_for_each_mut(&mut self.cells, |cell_idx, cell| {
            let cell_pos = idx_to_cell(cell_idx).as_ivec2();

            cell.clear();

            for id in 0..allocator.capacity() {
                if !allocator.is_allocated(crate::SurfelId::new(id)) {
                    continue;
                }

                let Some(ndc) = camera.world_to_ndc(surfaces[id as usize].position) else {
                    continue;
                };

                let home = camera.ndc_to_cell(ndc.truncate()).as_ivec2();
                let delta = (home - cell_pos).abs();

                if delta.x <= radius && delta.y <= radius {
                    cell.push(id);
                }
            }
        });
    }

    pub fn cell(&self, pos: UVec2) -> &CacheCell {
        &self.cells[cell_to_idx(pos)]
    }

    pub fn cells(&self) -> &[CacheCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [CacheCell] {
        &mut self.cells
    }
}
