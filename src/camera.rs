use bytemuck::{Pod, Zeroable};
use glam::{uvec2, vec2, Mat4, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{Ray, GRID_SIZE};

/// Camera/view descriptor, provided by the host renderer.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, Pod, Zeroable)]
pub struct Camera {
    pub projection_view: Mat4,
    pub ndc_to_world: Mat4,

    /// x,y,z - world-space camera position
    /// w - exposure
    pub origin: Vec4,

    /// x,y - viewport size, in pixels
    /// z,w - unused
    pub screen: Vec4,
}

impl Camera {
    /// Builds a camera from a perspective projection and a look-at view; a
    /// convenience for hosts and tests that don't carry their own matrices.
    pub fn look_at(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        screen_size: UVec2,
        exposure: f32,
    ) -> Self {
        let aspect = screen_size.x as f32 / screen_size.y as f32;
        let projection = Mat4::perspective_infinite_reverse_rh(fov_y, aspect, 0.1);
        let view = Mat4::look_at_rh(position, target, up);
        let projection_view = projection * view;

        Self {
            projection_view,
            ndc_to_world: projection_view.inverse(),
            origin: position.extend(exposure),
            screen: screen_size.as_vec2().extend(0.0).extend(0.0),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.origin.xyz()
    }

    pub fn exposure(&self) -> f32 {
        self.origin.w
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen.xy().as_uvec2()
    }

    /// Given a point in world-coordinates, returns it in clip-coordinates.
    pub fn world_to_clip(&self, pos: Vec3) -> Vec4 {
        self.projection_view * pos.extend(1.0)
    }

    /// Given a point in world-coordinates, returns it in normalized device
    /// coordinates, or `None` if the point lies outside the frustum.
    pub fn world_to_ndc(&self, pos: Vec3) -> Option<Vec3> {
        let clip = self.world_to_clip(pos);

        if clip.w <= 0.0 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;

        let contained = ndc.x >= -1.0
            && ndc.x <= 1.0
            && ndc.y >= -1.0
            && ndc.y <= 1.0
            && ndc.z >= 0.0
            && ndc.z <= 1.0;

        contained.then_some(ndc)
    }

    /// Given a point in normalized device coordinates, returns the grid cell
    /// it belongs to.
    pub fn ndc_to_cell(&self, ndc: Vec2) -> UVec2 {
        let uv = vec2(ndc.x, -ndc.y) * 0.5 + 0.5;
        let max = (GRID_SIZE - 1) as f32;
        let cell = (uv * (GRID_SIZE as f32)).clamp(Vec2::ZERO, Vec2::splat(max));

        cell.as_uvec2()
    }

    /// Given a point in screen-coordinates, returns the grid cell it belongs
    /// to.
    pub fn screen_to_cell(&self, pos: UVec2) -> UVec2 {
        let max = (GRID_SIZE - 1) as u32;
        let cell = pos * (GRID_SIZE as u32) / self.screen_size().max(UVec2::ONE);

        cell.min(UVec2::splat(max))
    }

    /// Given a grid cell and a sub-cell offset in `<0.0, 1.0>`, returns the
    /// screen position it maps to.
    pub fn cell_to_screen(&self, cell: UVec2, offset: Vec2) -> UVec2 {
        let uv = (cell.as_vec2() + offset) / (GRID_SIZE as f32);
        let pos = uv * self.screen.xy();

        pos.as_uvec2().min(self.screen_size() - UVec2::ONE)
    }

    /// Casts a ray from camera's center through given screen-coordinates.
    pub fn ray(&self, screen_pos: UVec2) -> Ray {
        let screen_size = self.screen.xy();
        let ndc = (screen_pos.as_vec2() + 0.5) * 2.0 / screen_size - Vec2::ONE;
        let ndc = vec2(ndc.x, -ndc.y);

        let far_plane = self.ndc_to_world.project_point3(ndc.extend(f32::EPSILON));
        let near_plane = self.ndc_to_world.project_point3(ndc.extend(1.0));

        Ray::new(near_plane, (far_plane - near_plane).normalize())
    }

    /// Reconstructs the world-space position seen through given pixel, where
    /// `depth` is the distance along the camera ray.
    pub fn reconstruct_position(&self, screen_pos: UVec2, depth: f32) -> Vec3 {
        self.ray(screen_pos).at(depth)
    }
}

/// Returns a unique index for given grid cell.
pub fn cell_to_idx(cell: UVec2) -> usize {
    (cell.y as usize) * GRID_SIZE + (cell.x as usize)
}

/// See: [`cell_to_idx()`].
pub fn idx_to_cell(idx: usize) -> UVec2 {
    uvec2((idx % GRID_SIZE) as u32, (idx / GRID_SIZE) as u32)
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3};

    use super::*;

    fn target() -> Camera {
        Camera::look_at(
            vec3(0.0, 1.0, 5.0),
            vec3(0.0, 1.0, 0.0),
            Vec3::Y,
            1.0,
            uvec2(320, 240),
            1.0,
        )
    }

    #[test]
    fn ndc_roundtrip() {
        let camera = target();
        let pos = vec3(0.3, 1.2, -1.0);

        let ndc = camera.world_to_ndc(pos).unwrap();

        assert!(ndc.x.abs() <= 1.0);
        assert!(ndc.y.abs() <= 1.0);

        let ray = camera.ray(uvec2(160, 120));
        let reconstructed = ray.at((vec3(0.0, 1.0, 0.0) - ray.origin()).length());

        assert!(reconstructed.distance(vec3(0.0, 1.0, 0.0)) < 0.05);
    }

    #[test]
    fn behind_camera_is_outside_frustum() {
        assert!(target().world_to_ndc(vec3(0.0, 1.0, 100.0)).is_none());
    }

    #[test]
    fn cell_indexing_roundtrip() {
        for idx in 0..GRID_SIZE * GRID_SIZE {
            assert_eq!(cell_to_idx(idx_to_cell(idx)), idx);
        }
    }

    #[test]
    fn cell_to_screen_stays_in_cell() {
        let camera = target();

        for cell_idx in 0..GRID_SIZE * GRID_SIZE {
            let cell = idx_to_cell(cell_idx);
            let pos = camera.cell_to_screen(cell, vec2(0.5, 0.5));

            assert_eq!(camera.screen_to_cell(pos), cell);
        }
    }
}
