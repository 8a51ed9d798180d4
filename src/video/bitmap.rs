use crate::error::VideoError;

/// Bytes per row of a 1-bit plane `width` pixels wide.
pub const fn plane_stride(width: usize) -> usize {
    (width + 7) / 8
}

/// A single 1-bit plane. Rows start on byte boundaries, bit 7 is the
/// leftmost pixel of each byte.
#[derive(Debug, Clone, Copy)]
struct Plane<'a> {
    data: &'a [u8],
    stride: usize,
}

impl Plane<'_> {
    #[inline]
    fn bit(&self, x: usize, y: usize) -> bool {
        let byte = self.data[y * self.stride + x / 8];
        byte & (0x80 >> (x % 8)) != 0
    }
}

fn check_len(data: &[u8], expected: usize) -> Result<(), VideoError> {
    if data.len() < expected {
        return Err(VideoError::ImageSize { expected, actual: data.len() });
    }
    Ok(())
}

/// A 1 bit per pixel image: fonts, tile masks, cursors.
#[derive(Debug, Clone, Copy)]
pub struct BitImage<'a> {
    plane: Plane<'a>,
    width: usize,
    height: usize,
}

impl<'a> BitImage<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Result<Self, VideoError> {
        let stride = plane_stride(width);
        check_len(data, stride * height)?;
        Ok(Self { plane: Plane { data, stride }, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn bit(&self, x: usize, y: usize) -> bool {
        self.plane.bit(x, y)
    }
}

/// EGA-style planar 16-colour graphics.
///
/// Planes are stored one after another, each `plane_stride(width) * height`
/// bytes. Unmasked images have four colour planes holding bits 0..3 of the
/// palette index. Masked images carry a leading mask plane (set = transparent)
/// followed by the four colour planes.
#[derive(Debug, Clone, Copy)]
pub struct PlanarImage<'a> {
    mask: Option<Plane<'a>>,
    colour: [Plane<'a>; 4],
    width: usize,
    height: usize,
}

impl<'a> PlanarImage<'a> {
    pub fn unmasked(data: &'a [u8], width: usize, height: usize) -> Result<Self, VideoError> {
        Self::build(data, width, height, false)
    }

    pub fn masked(data: &'a [u8], width: usize, height: usize) -> Result<Self, VideoError> {
        Self::build(data, width, height, true)
    }

    fn build(data: &'a [u8], width: usize, height: usize, masked: bool) -> Result<Self, VideoError> {
        let stride = plane_stride(width);
        let plane_size = stride * height;
        let count = if masked { 5 } else { 4 };
        check_len(data, plane_size * count)?;

        let plane = |n: usize| Plane { data: &data[n * plane_size..(n + 1) * plane_size], stride };
        let first = if masked { 1 } else { 0 };
        Ok(Self {
            mask: masked.then(|| plane(0)),
            colour: [plane(first), plane(first + 1), plane(first + 2), plane(first + 3)],
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Palette index at `(x, y)` assembled from the colour planes.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> u8 {
        self.colour
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, plane)| acc | ((plane.bit(x, y) as u8) << bit))
    }

    /// True when the mask plane marks `(x, y)` transparent. Unmasked images
    /// are opaque everywhere.
    #[inline]
    pub fn is_transparent(&self, x: usize, y: usize) -> bool {
        self.mask.map_or(false, |mask| mask.bit(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_stride() {
        assert_eq!(plane_stride(1), 1);
        assert_eq!(plane_stride(8), 1);
        assert_eq!(plane_stride(9), 2);
        assert_eq!(plane_stride(320), 40);
    }

    #[test]
    fn test_bit_image_msb_first() {
        // Row 0: 0b1010_0101, row 1: 0b0000_0001
        let data = [0b1010_0101, 0b0000_0001];
        let img = BitImage::new(&data, 8, 2).unwrap();
        let row0: Vec<bool> = (0..8).map(|x| img.bit(x, 0)).collect();
        assert_eq!(row0, [true, false, true, false, false, true, false, true]);
        assert!(img.bit(7, 1));
        assert!(!img.bit(0, 1));
    }

    #[test]
    fn test_bit_image_padded_rows() {
        // 10 pixels wide: 2 bytes per row
        let data = [0x00, 0b0100_0000, 0x80, 0x00];
        let img = BitImage::new(&data, 10, 2).unwrap();
        assert!(img.bit(9, 0));
        assert!(img.bit(0, 1));
        assert!(!img.bit(8, 0));
    }

    #[test]
    fn test_bit_image_too_short() {
        let err = BitImage::new(&[0u8; 3], 16, 2).unwrap_err();
        assert!(matches!(err, VideoError::ImageSize { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_planar_unmasked_index() {
        // 8x1 image, four planes of one byte each
        // pixel 0: planes 0,1,2,3 set -> 15
        // pixel 1: plane 2 only -> 4
        let data = [0b1000_0000, 0b1000_0000, 0b1100_0000, 0b1000_0000];
        let img = PlanarImage::unmasked(&data, 8, 1).unwrap();
        assert!(img.mask.is_none());
        assert_eq!(img.index(0, 0), 15);
        assert_eq!(img.index(1, 0), 4);
        assert_eq!(img.index(2, 0), 0);
        assert!(!img.is_transparent(0, 0));
    }

    #[test]
    fn test_planar_masked_layout() {
        // mask plane first: pixel 1 transparent
        let data = [0b0100_0000, 0b1000_0000, 0, 0, 0b1000_0000];
        let img = PlanarImage::masked(&data, 8, 1).unwrap();
        assert!(img.mask.is_some());
        assert_eq!(img.index(0, 0), 9);
        assert!(!img.is_transparent(0, 0));
        assert!(img.is_transparent(1, 0));
    }

    #[test]
    fn test_planar_too_short() {
        assert!(PlanarImage::unmasked(&[0u8; 7], 16, 1).is_err());
        assert!(PlanarImage::masked(&[0u8; 8], 8, 2).is_err());
        assert!(PlanarImage::masked(&[0u8; 10], 8, 2).is_ok());
    }
}
