use std::sync::atomic::{AtomicU32, Ordering};

use glam::{uvec2, Vec3, Vec4};

use crate::{
    dispatch, Camera, GBufferView, SlotAllocator, SpatialCache, SurfelId, SurfelIrradiance,
    SurfelSurface, EPSILON,
};

/// Resolves the surfel cloud into a per-pixel diffuse irradiance image.
///
/// Each pixel gathers the wide-kernel cell's surfels, weighted by a distance
/// falloff scaled with view distance and by normal similarity; every surfel
/// contributing positive weight gets its usage counter bumped, which feeds
/// the low-usage despawn next frame.
#[allow(clippy::too_many_arguments)]
pub fn resolve(
    camera: &Camera,
    gbuffer: GBufferView,
    cache: &SpatialCache,
    surfaces: &[SurfelSurface],
    irradiance: &[SurfelIrradiance],
    allocator: &SlotAllocator,
    usage: &[AtomicU32],
    affection_range: f32,
) -> Vec<Vec4> {
    let size = camera.screen_size();

    dispatch::par_map(size.x * size.y, |pixel_idx| {
        let pos = uvec2(pixel_idx % size.x, pixel_idx / size.x);
        let entry = gbuffer.get(pos);

        if entry.is_none() {
            return Vec4::ZERO;
        }

        let point = camera.reconstruct_position(pos, entry.depth);
        let view_distance = point.distance(camera.position());
        let range = affection_range * view_distance;

        let cell = cache.cell(camera.screen_to_cell(pos));
        let mut sum = Vec3::ZERO;
        let mut total_weight = 0.0;

        for id in cell.ids() {
            if !allocator.is_allocated(SurfelId::new(*id)) {
                continue;
            }

            let surface = surfaces[*id as usize];
            let falloff = (range - surface.position.distance(point)).max(0.0);
            let similarity = surface.normal.dot(entry.normal).max(0.0);
            let weight = falloff * similarity;

            if weight > 0.0 {
                sum += irradiance[*id as usize].mean * weight;
                total_weight += weight;

                usage[*id as usize].fetch_add(1, Ordering::AcqRel);
            }
        }

        if total_weight <= EPSILON * EPSILON {
            return Vec4::ZERO;
        }

        let diffuse = sum / total_weight * entry.albedo * camera.exposure();

        diffuse.extend(1.0)
    })
}

#[cfg(test)]
mod tests {
    use glam::{vec3, UVec2};

    use super::*;
    use crate::{CacheKernel, GBufferEntry, SpatialCache};

    #[test]
    fn zero_total_weight_resolves_to_zero() {
        let camera = Camera::look_at(
            vec3(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            1.0,
            UVec2::splat(8),
            1.0,
        );

        let allocator = SlotAllocator::new(32);
        let surfaces = vec![SurfelSurface::default(); 32];
        let irradiance = vec![SurfelIrradiance::default(); 32];
        let usage: Vec<AtomicU32> = (0..32).map(|_| AtomicU32::new(0)).collect();

        let mut cache = SpatialCache::new(16);

        cache.rebuild(CacheKernel::Wide, &camera, &surfaces, &allocator);

        let entries = vec![
            GBufferEntry {
                albedo: Vec3::ONE,
                normal: Vec3::Z,
                emissive: Vec3::ZERO,
                depth: 5.0,
            };
            64
        ];

        let out = resolve(
            &camera,
            GBufferView::new(UVec2::splat(8), &entries),
            &cache,
            &surfaces,
            &irradiance,
            &allocator,
            &usage,
            0.05,
        );

        assert!(out.iter().all(|pixel| *pixel == Vec4::ZERO));
        assert!(out.iter().all(|pixel| !pixel.x.is_nan()));
    }
}
