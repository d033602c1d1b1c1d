use glam::{uvec2, vec3, Vec3, Vec4};

use crate::{dispatch, Camera, GBufferView, SlotAllocator, SpatialCache, SurfelId, SurfelSurface};

/// Golden-ratio conjugate; spreads consecutive surfel ids across hues.
const HUE_STRIDE: f32 = 0.618_034;

/// Renders a debug image coloring each pixel by a hue derived from its
/// nearest surfel's id; off the hot path, for inspecting surfel coverage.
pub fn debug_view(
    camera: &Camera,
    gbuffer: GBufferView,
    cache: &SpatialCache,
    surfaces: &[SurfelSurface],
    allocator: &SlotAllocator,
) -> Vec<Vec4> {
    let size = camera.screen_size();

    dispatch::par_map(size.x * size.y, |pixel_idx| {
        let pos = uvec2(pixel_idx % size.x, pixel_idx / size.x);
        let entry = gbuffer.get(pos);

        if entry.is_none() {
            return Vec4::ZERO;
        }

        let point = camera.reconstruct_position(pos, entry.depth);
        let cell = cache.cell(camera.screen_to_cell(pos));

        let nearest = cell
            .ids()
            .iter()
            .filter(|id| allocator.is_allocated(SurfelId::new(**id)))
            .min_by(|a, b| {
                let da = surfaces[**a as usize].position.distance_squared(point);
                let db = surfaces[**b as usize].position.distance_squared(point);

                da.total_cmp(&db)
            });

        match nearest {
            Some(id) => hue((*id as f32 * HUE_STRIDE).fract()).extend(1.0),
            None => Vec4::ZERO,
        }
    })
}

fn hue(t: f32) -> Vec3 {
    (vec3(
        ((t + 1.0).fract() * 6.0 - 3.0).abs() - 1.0,
        ((t + 2.0 / 3.0).fract() * 6.0 - 3.0).abs() - 1.0,
        ((t + 1.0 / 3.0).fract() * 6.0 - 3.0).abs() - 1.0,
    ))
    .clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_stays_in_unit_range() {
        for step in 0..64 {
            let color = hue(step as f32 / 64.0);

            assert!(color.min_element() >= 0.0);
            assert!(color.max_element() <= 1.0);
        }
    }
}
