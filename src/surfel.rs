use glam::{vec2, Vec3, Vec4, Vec4Swizzles};

use crate::Normal;

/// Surfel slot index; only meaningful while the slot's presence bit is set.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct SurfelId(u32);

impl SurfelId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Spawn-time snapshot of the scene surface a surfel sits on.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct SurfelSurface {
    pub position: Vec3,
    pub normal: Vec3,
    pub albedo: Vec3,
}

impl SurfelSurface {
    pub fn unpack([d0, d1, _]: [Vec4; 3]) -> Self {
        Self {
            position: d0.xyz(),
            normal: Normal::decode(vec2(d0.w, d1.w)),
            albedo: d1.xyz(),
        }
    }

    pub fn pack(self) -> [Vec4; 3] {
        let n = Normal::encode(self.normal);

        [
            self.position.extend(n.x),
            self.albedo.extend(n.y),
            Vec4::ZERO,
        ]
    }
}

/// Running irradiance estimate of one surfel.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct SurfelIrradiance {
    /// Sample accepted this frame.
    pub current: Vec3,

    /// Sample accepted the previous frame.
    pub previous: Vec3,

    /// Running mean of accepted samples.
    pub mean: Vec3,

    /// Running mean of squared sample luminance; variance proxy.
    pub mean_sqr: f32,

    /// Number of samples folded into `mean`, saturating at the configured
    /// accumulation cap.
    pub probes: f32,

    /// Distance to the camera, refreshed once per frame before the spatial
    /// reuse phase reads it.
    pub distance_to_camera: f32,
}

impl SurfelIrradiance {
    pub fn unpack([d0, d1, d2]: [Vec4; 3]) -> Self {
        Self {
            current: d0.xyz(),
            previous: d2.xyz(),
            mean: d1.xyz(),
            mean_sqr: d2.w,
            probes: d0.w,
            distance_to_camera: d1.w,
        }
    }

    pub fn pack(self) -> [Vec4; 3] {
        [
            self.current.extend(self.probes),
            self.mean.extend(self.distance_to_camera),
            self.previous.extend(self.mean_sqr),
        ]
    }

    /// Luminance variance of the samples folded in so far.
    pub fn variance(&self) -> f32 {
        use crate::Vec3Ext;

        (self.mean_sqr - self.mean.luma() * self.mean.luma()).max(0.0)
    }
}
