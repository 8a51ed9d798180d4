use super::memory::MemoryTier;

/// What a surface is going to be used for. Only consulted by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceUsage {
    Default,
    FrontBuffer,
}

/// How a blit treats a destination rectangle that leaves the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clip {
    /// Pixels outside the surface are dropped.
    Silent,
    /// The caller guarantees the rectangle is in bounds. Checked in debug
    /// builds; release builds clip like [`Clip::Silent`].
    Strict,
}

/// A destination rectangle after clipping, with the offset into the source
/// of its top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
    pub src_x: usize,
    pub src_y: usize,
}

/// Clip the rectangle `(x, y, w, h)` to `[0, width) x [0, height)`.
///
/// Returns `None` when nothing remains.
pub fn clip_rect(
    width: usize,
    height: usize,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    clip: Clip,
) -> Option<Span> {
    if clip == Clip::Strict {
        debug_assert!(
            x >= 0 && y >= 0 && w >= 0 && h >= 0
                && x as i64 + w as i64 <= width as i64
                && y as i64 + h as i64 <= height as i64,
            "blit ({x}, {y}) {w}x{h} outside {width}x{height} surface"
        );
    }

    let x0 = (x as i64).max(0);
    let y0 = (y as i64).max(0);
    let x1 = (x as i64 + w as i64).min(width as i64);
    let y1 = (y as i64 + h as i64).min(height as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Span {
        x: x0 as usize,
        y: y0 as usize,
        w: (x1 - x0) as usize,
        h: (y1 - y0) as usize,
        src_x: (x0 - x as i64) as usize,
        src_y: (y0 - y as i64) as usize,
    })
}

/// An indexed-colour pixel buffer, one palette index per byte.
///
/// Surfaces are created and destroyed through the
/// [`Allocator`](super::memory::Allocator); the tier that owns the storage is
/// recorded at creation.
#[derive(Debug)]
pub struct Surface {
    width: usize,
    height: usize,
    usage: SurfaceUsage,
    tier: MemoryTier,
    pub(super) pixels: Box<[u8]>,
}

impl Surface {
    pub(super) fn new(
        width: usize,
        height: usize,
        usage: SurfaceUsage,
        tier: MemoryTier,
        pixels: Box<[u8]>,
    ) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self { width, height, usage, tier, pixels }
    }

    pub(super) fn into_pixels(self) -> Box<[u8]> {
        self.pixels
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Bytes of pixel storage held by this surface.
    pub fn mem_use(&self) -> usize {
        self.width * self.height
    }

    pub fn usage(&self) -> SurfaceUsage {
        self.usage
    }

    pub fn tier(&self) -> MemoryTier {
        self.tier
    }

    /// Palette index at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width + x as usize])
    }

    /// One row of pixels.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(super) fn span(&self, x: i32, y: i32, w: i32, h: i32, clip: Clip) -> Option<Span> {
        clip_rect(self.width, self.height, x, y, w, h, clip)
    }
}
