//! Pixel transfers into surfaces.
//!
//! Every operation goes through [`Surface::span`], so nothing is ever
//! written outside the destination. Operations that historically trusted
//! their caller use [`Clip::Strict`]; fills and the clipping sprite blits
//! use [`Clip::Silent`].

use super::bitmap::{BitImage, PlanarImage};
use super::surface::{clip_rect, Clip, Span, Surface};

impl Surface {
    /// Visit every destination pixel of a clipped span together with its
    /// source coordinates.
    fn for_each_in(&mut self, span: Span, mut f: impl FnMut(&mut u8, usize, usize)) {
        let width = self.width();
        for row in 0..span.h {
            let start = (span.y + row) * width + span.x;
            let line = &mut self.pixels[start..start + span.w];
            for (col, p) in line.iter_mut().enumerate() {
                f(p, span.src_x + col, span.src_y + row);
            }
        }
    }

    /// Fill a rectangle with one palette index.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: u8) {
        let Some(span) = self.span(x, y, w, h, Clip::Silent) else {
            return;
        };
        let width = self.width();
        for row in span.y..span.y + span.h {
            let start = row * width + span.x;
            self.pixels[start..start + span.w].fill(colour);
        }
    }

    /// Fill a rectangle, touching only the bit planes selected by `plane_mask`.
    pub fn fill_rect_pm(&mut self, x: i32, y: i32, w: i32, h: i32, colour: u8, plane_mask: u8) {
        let mask = plane_mask & 0x0F;
        let colour = colour & mask;
        let Some(span) = self.span(x, y, w, h, Clip::Silent) else {
            return;
        };
        self.for_each_in(span, |p, _, _| *p = (*p & !mask) | colour);
    }

    /// Copy `sw` x `sh` pixels at `(sx, sy)` of `src` to `(x, y)` of `self`.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_from(&mut self, src: &Surface, x: i32, y: i32, sx: i32, sy: i32, sw: i32, sh: i32) {
        let Some((dst, from)) = copy_spans(src, self, x, y, sx, sy, sw, sh) else {
            return;
        };
        let (src_width, dst_width) = (src.width(), self.width());
        for row in 0..dst.h {
            let s = (from.y + row) * src_width + from.x;
            let d = (dst.y + row) * dst_width + dst.x;
            self.pixels[d..d + dst.w].copy_from_slice(&src.pixels[s..s + dst.w]);
        }
    }

    /// Copy a rectangle of this surface onto itself. Source and destination
    /// may overlap.
    ///
    /// When the source lies below the destination rows are moved top to
    /// bottom, otherwise bottom to top. Each row is an overlapping move.
    pub fn copy_within(&mut self, x: i32, y: i32, sx: i32, sy: i32, sw: i32, sh: i32) {
        let this: &Surface = self;
        let Some((dst, from)) = copy_spans(this, this, x, y, sx, sy, sw, sh) else {
            return;
        };
        let width = self.width();
        let mut move_row = |row: usize| {
            let s = (from.y + row) * width + from.x;
            let d = (dst.y + row) * width + dst.x;
            self.pixels.copy_within(s..s + dst.w, d);
        };
        if from.y > dst.y {
            (0..dst.h).for_each(&mut move_row);
        } else {
            (0..dst.h).rev().for_each(&mut move_row);
        }
    }

    /// Shift the whole surface by `(dx, dy)`.
    ///
    /// A positive shift pulls content from the right/bottom towards the
    /// origin. Uncovered pixels keep their old contents.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        let w = self.width() as i64 - (dx as i64).abs();
        let h = self.height() as i64 - (dy as i64).abs();
        if w <= 0 || h <= 0 {
            return;
        }
        let (x, sx) = if dx > 0 { (0, dx) } else { (-dx, 0) };
        let (y, sy) = if dy > 0 { (0, dy) } else { (-dy, 0) };
        self.copy_within(x, y, sx, sy, w as i32, h as i32);
    }

    /// Draw planar graphics opaquely.
    pub fn unmasked_to_surface(&mut self, img: &PlanarImage, x: i32, y: i32) {
        self.planar(img, x, y, Clip::Strict, 0x0F);
    }

    /// Draw planar graphics opaquely, writing only the planes in `plane_mask`.
    pub fn unmasked_to_surface_pm(&mut self, img: &PlanarImage, x: i32, y: i32, plane_mask: u8) {
        self.planar(img, x, y, Clip::Strict, plane_mask & 0x0F);
    }

    /// Draw planar graphics, skipping pixels the mask plane marks
    /// transparent.
    pub fn masked_to_surface(&mut self, img: &PlanarImage, x: i32, y: i32) {
        self.planar(img, x, y, Clip::Strict, 0x0F);
    }

    /// As [`Surface::masked_to_surface`], for sprites that may hang off the
    /// edge of the surface.
    pub fn masked_blit_to_surface(&mut self, img: &PlanarImage, x: i32, y: i32) {
        self.planar(img, x, y, Clip::Silent, 0x0F);
    }

    fn planar(&mut self, img: &PlanarImage, x: i32, y: i32, clip: Clip, mask: u8) {
        let Some(span) = self.span(x, y, img.width() as i32, img.height() as i32, clip) else {
            return;
        };
        self.for_each_in(span, |p, ix, iy| {
            if !img.is_transparent(ix, iy) {
                *p = (*p & !mask) | (img.index(ix, iy) & mask);
            }
        });
    }

    /// 1-bit opaque draw: set bits become `colour`, clear bits become 0.
    pub fn bit_to_surface(&mut self, img: &BitImage, x: i32, y: i32, colour: u8) {
        self.bits(img, x, y, Clip::Strict, |p, bit| *p = if bit { colour } else { 0 });
    }

    /// 1-bit opaque draw restricted to the planes in `plane_mask`.
    pub fn bit_to_surface_pm(&mut self, img: &BitImage, x: i32, y: i32, colour: u8, plane_mask: u8) {
        let mask = plane_mask & 0x0F;
        self.bits(img, x, y, Clip::Strict, |p, bit| {
            let value = if bit { colour } else { 0 };
            *p = (*p & !mask) | (value & mask);
        });
    }

    /// XOR `colour` into the pixels under set bits.
    pub fn bit_xor_with_surface(&mut self, img: &BitImage, x: i32, y: i32, colour: u8) {
        self.bits(img, x, y, Clip::Strict, |p, bit| {
            if bit {
                *p ^= colour;
            }
        });
    }

    /// Write `colour` under set bits, leave the rest alone.
    pub fn bit_blit_to_surface(&mut self, img: &BitImage, x: i32, y: i32, colour: u8) {
        self.bits(img, x, y, Clip::Strict, |p, bit| {
            if bit {
                *p = colour;
            }
        });
    }

    /// Write `colour` under clear bits, leave the rest alone. Clips.
    pub fn bit_inv_blit_to_surface(&mut self, img: &BitImage, x: i32, y: i32, colour: u8) {
        self.bits(img, x, y, Clip::Silent, |p, bit| {
            if !bit {
                *p = colour;
            }
        });
    }

    fn bits(&mut self, img: &BitImage, x: i32, y: i32, clip: Clip, mut op: impl FnMut(&mut u8, bool)) {
        let Some(span) = self.span(x, y, img.width() as i32, img.height() as i32, clip) else {
            return;
        };
        self.for_each_in(span, |p, ix, iy| op(p, img.bit(ix, iy)));
    }
}

/// Clip a surface-to-surface copy against both the source and destination.
///
/// Returns the destination span and the matching source origin.
#[allow(clippy::too_many_arguments)]
fn copy_spans(
    src: &Surface,
    dst: &Surface,
    x: i32,
    y: i32,
    sx: i32,
    sy: i32,
    sw: i32,
    sh: i32,
) -> Option<(Span, Span)> {
    let from = clip_rect(src.width(), src.height(), sx, sy, sw, sh, Clip::Strict)?;
    // a destination origin past i32::MAX is off the surface anyway
    let to_x = i32::try_from(x as i64 + from.src_x as i64).ok()?;
    let to_y = i32::try_from(y as i64 + from.src_y as i64).ok()?;
    let to = clip_rect(
        dst.width(),
        dst.height(),
        to_x,
        to_y,
        from.w as i32,
        from.h as i32,
        Clip::Strict,
    )?;
    let from = Span {
        x: from.x + to.src_x,
        y: from.y + to.src_y,
        w: to.w,
        h: to.h,
        src_x: 0,
        src_y: 0,
    };
    Some((to, from))
}
