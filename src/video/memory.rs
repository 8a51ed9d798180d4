use log::{debug, error, warn};

use super::surface::{Surface, SurfaceUsage};
use crate::error::VideoError;

/// Where a surface's pixels live, fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTier {
    /// The single reserved front buffer.
    FrontBuffer,
    /// General-purpose internal RAM.
    Internal,
    /// Slower external/overflow RAM.
    External,
}

/// Byte budget for one heap tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    pub capacity: usize,
    pub used: usize,
}

impl Pool {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, used: 0 }
    }

    fn alloc(&mut self, bytes: usize) -> Option<Box<[u8]>> {
        if bytes > self.capacity - self.used {
            return None;
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes).ok()?;
        buf.resize(bytes, 0);
        self.used += bytes;
        Some(buf.into_boxed_slice())
    }

    fn free(&mut self, buf: Box<[u8]>) {
        if buf.len() > self.used {
            warn!("freeing {} bytes from a pool holding {}", buf.len(), self.used);
        }
        self.used = self.used.saturating_sub(buf.len());
    }
}

/// Hands out surface storage from the front buffer slot, then internal RAM,
/// then external RAM.
#[derive(Debug)]
pub struct Allocator {
    front_width: usize,
    front_height: usize,
    /// `None` while a surface holds the front buffer.
    front_buffer: Option<Box<[u8]>>,
    internal: Pool,
    external: Pool,
}

impl Allocator {
    pub fn new(
        front_width: usize,
        front_height: usize,
        internal_capacity: usize,
        external_capacity: usize,
    ) -> Self {
        Self {
            front_width,
            front_height,
            front_buffer: Some(vec![0u8; front_width * front_height].into_boxed_slice()),
            internal: Pool::new(internal_capacity),
            external: Pool::new(external_capacity),
        }
    }

    pub fn front_buffer_in_use(&self) -> bool {
        self.front_buffer.is_none()
    }

    /// Accounting for a heap tier. The front buffer has no pool.
    pub fn pool(&self, tier: MemoryTier) -> Option<Pool> {
        match tier {
            MemoryTier::FrontBuffer => None,
            MemoryTier::Internal => Some(self.internal),
            MemoryTier::External => Some(self.external),
        }
    }

    /// Allocate a `width` x `height` surface from the fastest tier that can
    /// hold it.
    pub fn try_create(
        &mut self,
        width: usize,
        height: usize,
        usage: SurfaceUsage,
    ) -> Result<Surface, VideoError> {
        let bytes = width
            .checked_mul(height)
            .ok_or(VideoError::OutOfMemory { bytes: usize::MAX })?;

        if usage == SurfaceUsage::FrontBuffer
            && width == self.front_width
            && height == self.front_height
        {
            if let Some(pixels) = self.front_buffer.take() {
                debug!("surface {}x{} bound to front buffer", width, height);
                return Ok(Surface::new(width, height, usage, MemoryTier::FrontBuffer, pixels));
            }
            warn!("front buffer already in use, trying internal RAM");
        }

        if let Some(pixels) = self.internal.alloc(bytes) {
            debug!("surface {}x{} in internal RAM ({} bytes)", width, height, bytes);
            return Ok(Surface::new(width, height, usage, MemoryTier::Internal, pixels));
        }

        warn!("could not allocate {} bytes internally, trying external RAM", bytes);
        if let Some(pixels) = self.external.alloc(bytes) {
            debug!("surface {}x{} in external RAM ({} bytes)", width, height, bytes);
            return Ok(Surface::new(width, height, usage, MemoryTier::External, pixels));
        }

        Err(VideoError::OutOfMemory { bytes })
    }

    /// Like [`Allocator::try_create`], but exhausting every tier is fatal:
    /// the error is logged and the calling thread parks forever.
    pub fn create(&mut self, width: usize, height: usize, usage: SurfaceUsage) -> Surface {
        match self.try_create(width, height, usage) {
            Ok(surface) => surface,
            Err(err) => {
                error!("{}", err);
                loop {
                    std::thread::park();
                }
            }
        }
    }

    /// Return a surface's storage to the tier it came from.
    pub fn destroy(&mut self, surface: Surface) {
        let tier = surface.tier();
        let pixels = surface.into_pixels();
        match tier {
            MemoryTier::FrontBuffer => {
                if self.front_buffer.is_some() {
                    warn!("front buffer returned while not in use, dropping it");
                } else {
                    self.front_buffer = Some(pixels);
                }
            }
            MemoryTier::External => self.external.free(pixels),
            MemoryTier::Internal => self.internal.free(pixels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator() -> Allocator {
        Allocator::new(336, 224, 128 * 1024, 1024 * 1024)
    }

    #[test]
    fn test_front_buffer_claimed_and_released() {
        let mut alloc = allocator();
        let surface = alloc.try_create(336, 224, SurfaceUsage::FrontBuffer).unwrap();
        assert_eq!(surface.tier(), MemoryTier::FrontBuffer);
        assert!(alloc.front_buffer_in_use());

        alloc.destroy(surface);
        assert!(!alloc.front_buffer_in_use());
        assert_eq!(alloc.pool(MemoryTier::Internal).unwrap().used, 0);
    }

    #[test]
    fn test_front_buffer_requires_usage_and_size() {
        let mut alloc = allocator();
        let wrong_usage = alloc.try_create(336, 224, SurfaceUsage::Default).unwrap();
        assert_eq!(wrong_usage.tier(), MemoryTier::Internal);
        let wrong_size = alloc.try_create(320, 200, SurfaceUsage::FrontBuffer).unwrap();
        assert_eq!(wrong_size.tier(), MemoryTier::Internal);
        assert!(!alloc.front_buffer_in_use());
    }

    #[test]
    fn test_second_front_buffer_falls_back() {
        let mut alloc = allocator();
        let mut first = alloc.try_create(336, 224, SurfaceUsage::FrontBuffer).unwrap();
        let second = alloc.try_create(336, 224, SurfaceUsage::FrontBuffer).unwrap();
        assert_eq!(second.tier(), MemoryTier::Internal);

        // The two surfaces must not share storage
        first.fill_rect(0, 0, 336, 224, 9);
        assert!(second.pixels().iter().all(|&p| p == 0));
        assert_ne!(first.pixels().as_ptr(), second.pixels().as_ptr());

        alloc.destroy(second);
        alloc.destroy(first);
        assert!(!alloc.front_buffer_in_use());
    }

    #[test]
    fn test_internal_overflow_goes_external() {
        let mut alloc = Allocator::new(336, 224, 1000, 10_000);
        let a = alloc.try_create(30, 30, SurfaceUsage::Default).unwrap();
        assert_eq!(a.tier(), MemoryTier::Internal);
        let b = alloc.try_create(30, 30, SurfaceUsage::Default).unwrap();
        assert_eq!(b.tier(), MemoryTier::External);
        assert_eq!(alloc.pool(MemoryTier::Internal).unwrap().used, 900);
        assert_eq!(alloc.pool(MemoryTier::External).unwrap().used, 900);

        alloc.destroy(b);
        alloc.destroy(a);
        assert_eq!(alloc.pool(MemoryTier::Internal).unwrap().used, 0);
        assert_eq!(alloc.pool(MemoryTier::External).unwrap().used, 0);
    }

    #[test]
    fn test_all_tiers_exhausted() {
        let mut alloc = Allocator::new(336, 224, 100, 100);
        let err = alloc.try_create(20, 20, SurfaceUsage::Default).unwrap_err();
        assert!(matches!(err, VideoError::OutOfMemory { bytes: 400 }));
        assert_eq!(alloc.pool(MemoryTier::Internal).unwrap().used, 0);
        assert_eq!(alloc.pool(MemoryTier::External).unwrap().used, 0);
    }

    #[test]
    fn test_oversized_request_fails_cleanly() {
        let mut alloc = allocator();
        let err = alloc.try_create(1 << (usize::BITS - 1), 2, SurfaceUsage::Default).unwrap_err();
        assert!(matches!(err, VideoError::OutOfMemory { bytes: usize::MAX }));
        assert_eq!(alloc.pool(MemoryTier::Internal).unwrap().used, 0);
        assert_eq!(alloc.pool(MemoryTier::External).unwrap().used, 0);
    }

    #[test]
    fn test_destroy_into_foreign_allocator() {
        let mut owner = allocator();
        let mut other = allocator();
        let surface = owner.try_create(64, 64, SurfaceUsage::Default).unwrap();
        let front = owner.try_create(336, 224, SurfaceUsage::FrontBuffer).unwrap();

        other.destroy(surface);
        other.destroy(front);
        assert_eq!(other.pool(MemoryTier::Internal).unwrap().used, 0);
        assert!(!other.front_buffer_in_use());

        // accounting is intact, so the full budget is still available
        let big = other.try_create(128 * 1024, 1, SurfaceUsage::Default).unwrap();
        assert_eq!(big.tier(), MemoryTier::Internal);
    }

    #[test]
    fn test_create_destroy_leaves_no_trace() {
        let mut alloc = allocator();
        for &(w, h, usage) in &[
            (336, 224, SurfaceUsage::FrontBuffer),
            (16, 16, SurfaceUsage::Default),
            (320, 200, SurfaceUsage::Default),
            (336, 224, SurfaceUsage::Default),
        ] {
            let before = (
                alloc.front_buffer_in_use(),
                alloc.pool(MemoryTier::Internal),
                alloc.pool(MemoryTier::External),
            );
            let surface = alloc.create(w, h, usage);
            assert_eq!(surface.pixels().len(), w * h);
            alloc.destroy(surface);
            let after = (
                alloc.front_buffer_in_use(),
                alloc.pool(MemoryTier::Internal),
                alloc.pool(MemoryTier::External),
            );
            assert_eq!(before, after);
        }
    }
}
