use glam::Vec3;

#[derive(Copy, Clone, Default, Debug)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// How far to move a ray origin away from its surface to avoid
    /// self-intersection when casting shadow rays.
    pub const NUDGE_OFFSET: f32 = 0.01;

    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Like [`Self::new()`], but with the origin nudged along the surface
    /// normal; use for occlusion rays leaving a surface.
    pub fn shadow(origin: Vec3, normal: Vec3, direction: Vec3) -> Self {
        Self {
            origin: origin + normal * Self::NUDGE_OFFSET,
            direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Ray-intersection service over the static scene geometry; implemented by
/// the host renderer (typically on top of a BVH or a hardware ray query).
pub trait Raycaster: Sync {
    /// Returns the distance to the nearest hit, if any.
    fn nearest_hit(&self, ray: Ray) -> Option<f32>;

    /// Returns whether anything lies on `ray` up to `max_distance`.
    fn occluded(&self, ray: Ray, max_distance: f32) -> bool;
}

/// Scene with no geometry; nothing ever occludes anything.
pub struct EmptyScene;

impl Raycaster for EmptyScene {
    fn nearest_hit(&self, _ray: Ray) -> Option<f32> {
        None
    }

    fn occluded(&self, _ray: Ray, _max_distance: f32) -> bool {
        false
    }
}
