use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::{F32Ext, WhiteNoise, EPSILON};

/// Scene light source: a directional light or an emissive triangle.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, Pod, Zeroable)]
pub struct Light {
    /// x,y,z - directional: direction; emissive: vertex a
    /// w - (as u32) light type
    pub d0: Vec4,

    /// x,y,z - emissive: vertex b
    pub d1: Vec4,

    /// x,y,z - emissive: vertex c
    pub d2: Vec4,

    /// x,y,z - radiance
    pub d3: Vec4,
}

impl Light {
    pub const TYPE_DIRECTIONAL: u32 = 0;
    pub const TYPE_EMISSIVE: u32 = 1;

    /// Stand-in distance for directional lights.
    pub const FAR: f32 = 1e30;

    pub fn directional(direction: Vec3, radiance: Vec3) -> Self {
        Self {
            d0: direction
                .normalize()
                .extend(f32::from_bits(Self::TYPE_DIRECTIONAL)),
            d3: radiance.extend(0.0),
            ..Default::default()
        }
    }

    pub fn emissive(a: Vec3, b: Vec3, c: Vec3, radiance: Vec3) -> Self {
        Self {
            d0: a.extend(f32::from_bits(Self::TYPE_EMISSIVE)),
            d1: b.extend(0.0),
            d2: c.extend(0.0),
            d3: radiance.extend(0.0),
        }
    }

    pub fn is_directional(&self) -> bool {
        self.d0.w.to_bits() == Self::TYPE_DIRECTIONAL
    }

    pub fn direction(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.d0.xyz(), self.d1.xyz(), self.d2.xyz()]
    }

    pub fn radiance(&self) -> Vec3 {
        self.d3.xyz()
    }

    pub fn area(&self) -> f32 {
        let [a, b, c] = self.vertices();

        0.5 * (b - a).cross(c - a).length()
    }

    pub fn normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices();

        (b - a).cross(c - a).normalize()
    }

    /// Samples this light as seen from `at`, drawing the light-point from
    /// `noise`; the same noise state always regenerates the same point.
    ///
    /// The returned radiance folds in the emitter-side cosine and the
    /// inverse-square falloff, but not the receiver-side cosine nor the pdf.
    pub fn sample(&self, at: Vec3, noise: &mut WhiteNoise) -> LightSample {
        if self.is_directional() {
            return LightSample {
                point: at - self.direction() * Self::FAR,
                dir: -self.direction(),
                distance: Self::FAR,
                radiance: self.radiance(),
                pdf: 1.0,
            };
        }

        let [a, b, c] = self.vertices();

        // Uniform sample over the triangle's area
        let u = noise.sample().sqrt();
        let v = noise.sample();
        let point = a * (1.0 - u) + b * (u * (1.0 - v)) + c * (u * v);

        let to_light = point - at;
        let distance_sqr = to_light.length_squared().max(EPSILON);
        let distance = distance_sqr.sqrt();
        let dir = to_light / distance;

        // Two-sided emitter
        let cos_light = self.normal().dot(-dir).abs();

        LightSample {
            point,
            dir,
            distance,
            radiance: self.radiance() * cos_light / distance_sqr,
            pdf: 1.0 / self.area().max(EPSILON.sqr()),
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct LightId(u32);

impl LightId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct LightSample {
    pub point: Vec3,
    pub dir: Vec3,
    pub distance: f32,
    pub radiance: Vec3,
    pub pdf: f32,
}

#[derive(Clone, Copy)]
pub struct LightsView<'a> {
    items: &'a [Light],
}

impl<'a> LightsView<'a> {
    pub fn new(items: &'a [Light]) -> Self {
        Self { items }
    }

    pub fn get(&self, id: LightId) -> Light {
        self.items[id.get() as usize]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec3};

    use super::*;

    #[test]
    fn emissive_sampling_is_deterministic() {
        let light = Light::emissive(
            vec3(-1.0, 2.0, -1.0),
            vec3(1.0, 2.0, -1.0),
            vec3(0.0, 2.0, 1.0),
            vec3(5.0, 5.0, 5.0),
        );

        let noise = WhiteNoise::new(42, uvec2(7, 3));

        let a = light.sample(Vec3::ZERO, &mut noise.clone());
        let b = light.sample(Vec3::ZERO, &mut noise.clone());

        assert_eq!(a.point, b.point);
        assert_eq!(a.radiance, b.radiance);
        assert_eq!(a.pdf, b.pdf);
    }

    #[test]
    fn emissive_pdf_is_inverse_area() {
        let light = Light::emissive(
            vec3(0.0, 0.0, 0.0),
            vec3(2.0, 0.0, 0.0),
            vec3(0.0, 2.0, 0.0),
            Vec3::ONE,
        );

        assert_relative_eq!(light.area(), 2.0);

        let sample = light.sample(vec3(0.0, 0.0, 3.0), &mut WhiteNoise::new(1, uvec2(0, 0)));

        assert_relative_eq!(sample.pdf, 0.5);
    }

    #[test]
    fn directional_sample_has_unit_pdf() {
        let light = Light::directional(vec3(0.0, -1.0, 0.0), Vec3::ONE);
        let sample = light.sample(Vec3::ZERO, &mut WhiteNoise::new(1, uvec2(0, 0)));

        assert_eq!(sample.pdf, 1.0);
        assert_eq!(sample.dir, vec3(0.0, 1.0, 0.0));
    }
}
