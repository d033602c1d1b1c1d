use bytemuck::{Pod, Zeroable};

/// Monotonically increasing frame counter; seeds the per-frame noise.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Pod, Zeroable)]
pub struct Frame(u32);

impl Frame {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Per-frame noise seed; scrambled so that consecutive frames decorrelate
    /// even for low invocation ids.
    pub fn seed(self) -> u32 {
        self.0.wrapping_mul(0x9e3779b9)
    }
}
