/// Current drawable size in physical pixels.
///
/// Render-target sizes declared with a `ViewPortRatio` annotation scale
/// against this; targets with no size annotation at all adopt it verbatim.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Scales by a per-axis ratio, clamping to at least one pixel.
    #[inline]
    pub fn scaled(self, rx: f32, ry: f32) -> (u32, u32) {
        let w = (self.width as f32 * rx).round().max(1.0) as u32;
        let h = (self.height as f32 * ry).round().max(1.0) as u32;
        (w, h)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
