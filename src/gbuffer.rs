use glam::{vec3, vec4, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{Normal, U32Ext};

/// One texel of the geometry/material buffer produced by the host's prepass.
///
/// A zeroed entry (depth `0.0`) marks a background miss.
#[derive(Clone, Copy, Default, Debug)]
pub struct GBufferEntry {
    pub albedo: Vec3,
    pub normal: Vec3,
    pub emissive: Vec3,

    /// Distance along the camera ray; `0.0` for a miss.
    pub depth: f32,
}

impl GBufferEntry {
    pub fn unpack([d0, d1]: [Vec4; 2]) -> Self {
        let albedo = {
            let [x, y, z, _] = d0.x.to_bits().to_bytes();

            vec3(x as f32 / 255.0, y as f32 / 255.0, z as f32 / 255.0)
        };

        Self {
            albedo,
            normal: Normal::decode(d0.yz()),
            emissive: d1.xyz(),
            depth: d1.w,
        }
    }

    pub fn pack(self) -> [Vec4; 2] {
        let x = {
            let albedo = (self.albedo.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).as_uvec3();

            f32::from_bits(u32::from_bytes([albedo.x, albedo.y, albedo.z, 0]))
        };

        let Vec2 { x: y, y: z } = Normal::encode(self.normal);
        let d0 = vec4(x, y, z, 0.0);
        let d1 = self.emissive.extend(self.depth);

        [d0, d1]
    }

    pub fn is_some(&self) -> bool {
        self.depth != 0.0
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }
}

/// Borrowed view over the host's G-buffer texture.
#[derive(Clone, Copy)]
pub struct GBufferView<'a> {
    size: UVec2,
    entries: &'a [GBufferEntry],
}

impl<'a> GBufferView<'a> {
    pub fn new(size: UVec2, entries: &'a [GBufferEntry]) -> Self {
        assert_eq!(entries.len(), (size.x * size.y) as usize);

        Self { size, entries }
    }

    pub fn get(&self, pos: UVec2) -> GBufferEntry {
        self.entries[(pos.y * self.size.x + pos.x) as usize]
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }
}
