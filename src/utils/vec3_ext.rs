use glam::{vec3, Vec3};

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Returns luminance of this color-vector.
    fn luma(self) -> f32;

    /// Returns perceptual luminance of this color-vector.
    ///
    /// As compared to the standard luminance, perceptual luminance gets a
    /// boost for darker colors and attenuates the brighter colors, so that
    /// comparisons between them behave more human-vision like.
    fn perc_luma(self) -> f32;
}

impl Vec3Ext for Vec3 {
    fn luma(self) -> f32 {
        self.dot(vec3(0.2126, 0.7152, 0.0722))
    }

    fn perc_luma(self) -> f32 {
        self.luma().sqrt()
    }
}
