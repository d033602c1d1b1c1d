use glam::{vec3, Vec2, Vec3, Vec3Swizzles};

pub struct Normal;

impl Normal {
    /// Compresses normal from Vec3 into Vec2 using octahedron-normal mapping.
    pub fn encode(n: Vec3) -> Vec2 {
        let n = n / (n.x.abs() + n.y.abs() + n.z.abs());

        let n = if n.z >= 0.0 {
            n.xy()
        } else {
            let mut t = 1.0 - n.yx().abs();

            t.x = t.x.copysign(n.x);
            t.y = t.y.copysign(n.y);
            t
        };

        n * 0.5 + 0.5
    }

    /// See: [`Self::encode()`].
    pub fn decode(n: Vec2) -> Vec3 {
        let n = n * 2.0 - 1.0;
        let mut n = vec3(n.x, n.y, 1.0 - n.x.abs() - n.y.abs());
        let t = (-n.z).max(0.0);

        n.x -= t.copysign(n.x);
        n.y -= t.copysign(n.y);
        n.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let targets = [
            vec3(0.0, 0.0, 1.0),
            vec3(0.0, 1.0, 0.0),
            vec3(-1.0, 0.0, 0.0),
            vec3(0.577, -0.577, 0.577),
            vec3(-0.267, 0.534, -0.802),
        ];

        for target in targets {
            let target = target.normalize();
            let actual = Normal::decode(Normal::encode(target));

            assert!(target.abs_diff_eq(actual, 0.01), "{target} != {actual}");
        }
    }
}
