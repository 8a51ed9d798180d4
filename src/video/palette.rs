/// Number of logical palette slots.
pub const PALETTE_SIZE: usize = 16;

/// Default adapter state: the 16 EGA colours as programmed at mode set.
pub const DEFAULT_EGA_PALETTE: [u8; PALETTE_SIZE] =
    [0, 1, 2, 3, 4, 5, 20, 7, 56, 57, 58, 59, 60, 61, 62, 63];

/// Convert one EGA colour number (`rgbRGB`, 6 bits) to RGB24.
///
/// Bits 2..0 carry the 2/3 intensity component for R, G, B and bits 5..3
/// the 1/3 component, so each channel is one of 0x00, 0x55, 0xAA, 0xFF.
const fn ega_rgb(n: usize) -> [u8; 3] {
    const fn channel(n: usize, hi: usize, lo: usize) -> u8 {
        (((n >> hi) & 1) * 0xAA + ((n >> lo) & 1) * 0x55) as u8
    }
    [channel(n, 2, 5), channel(n, 1, 4), channel(n, 0, 3)]
}

/// The fixed 64-entry EGA RGB24 table, indexed by EGA colour number.
pub const EGA_RGB: [[u8; 3]; 64] = {
    let mut t = [[0u8; 3]; 64];
    let mut i = 0;
    while i < 64 {
        t[i] = ega_rgb(i);
        i += 1;
    }
    t
};

/// A 16-bit panel colour, `R:5 G:6 B:5` from the most significant bit down.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Rgb565 = Rgb565::from_24bit(0, 0, 0);

    /// Make an [`Rgb565`] from a 24-bit RGB triplet.
    ///
    /// Only the top 5 bits of red and blue and the top 6 bits of green are
    /// retained.
    pub const fn from_24bit(red: u8, green: u8, blue: u8) -> Rgb565 {
        let r = (red >> 3) as u16;
        let g = (green >> 2) as u16;
        let b = (blue >> 3) as u16;
        Rgb565((r << 11) | (g << 5) | b)
    }

    /// Expand back to RGBA8 for a desktop window, replicating the high bits
    /// into the vacated low bits.
    pub const fn to_rgba(self) -> [u8; 4] {
        let r5 = ((self.0 >> 11) & 0x1F) as u8;
        let g6 = ((self.0 >> 5) & 0x3F) as u8;
        let b5 = (self.0 & 0x1F) as u8;
        [
            (r5 << 3) | (r5 >> 2),
            (g6 << 2) | (g6 >> 4),
            (b5 << 3) | (b5 >> 2),
            0xFF,
        ]
    }
}

/// Palette index to panel colour lookup.
///
/// Rebuilt wholesale by [`Palette::refresh`]. Until the first refresh the
/// table holds [`DEFAULT_EGA_PALETTE`].
#[derive(Debug, Clone)]
pub struct Palette {
    entries: [Rgb565; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        let mut palette = Self { entries: [Rgb565::BLACK; PALETTE_SIZE] };
        palette.refresh(&DEFAULT_EGA_PALETTE);
        palette
    }
}

impl Palette {
    /// Rebuild every entry from the adapter's EGA colour numbers.
    pub fn refresh(&mut self, adapter: &[u8; PALETTE_SIZE]) {
        for (entry, &ega) in self.entries.iter_mut().zip(adapter) {
            let [r, g, b] = EGA_RGB[(ega & 0x3F) as usize];
            *entry = Rgb565::from_24bit(r, g, b);
        }
    }

    /// Colour for a palette index. Only the low nibble is significant.
    #[inline]
    pub fn get(&self, index: u8) -> Rgb565 {
        self.entries[(index & 0x0F) as usize]
    }
}
