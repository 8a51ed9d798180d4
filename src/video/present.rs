use super::palette::{Palette, Rgb565};
use super::surface::Surface;

/// Physical panel width in pixels.
pub const PANEL_WIDTH: usize = 320;
/// Physical panel height in pixels.
pub const PANEL_HEIGHT: usize = 240;

/// Every source row whose absolute index is a multiple of this is drawn
/// twice, turning 200 rows into 240.
pub const ROW_DUPLICATE_PERIOD: usize = 5;

/// Converts surfaces into the RGB565 panel buffer.
pub struct Presenter {
    panel: Vec<Rgb565>,
}

impl Default for Presenter {
    fn default() -> Self {
        Self { panel: vec![Rgb565::BLACK; PANEL_WIDTH * PANEL_HEIGHT] }
    }
}

impl Presenter {
    /// The assembled panel, `PANEL_WIDTH * PANEL_HEIGHT` pixels row-major.
    pub fn panel(&self) -> &[Rgb565] {
        &self.panel
    }

    pub fn clear(&mut self) {
        self.panel.fill(Rgb565::BLACK);
    }

    /// Draw `surface` onto the panel with its top-left at
    /// `(scroll_x, scroll_y)`.
    ///
    /// Columns map 1:1 and are cut at the panel edge. Rows map 1:1 except
    /// that every source row `y` with `y % 5 == 0` is written to two panel
    /// rows. Panel pixels the surface does not reach are left as they were.
    ///
    /// Returns the number of panel rows written.
    pub fn render(&mut self, surface: &Surface, palette: &Palette, scroll_x: usize, scroll_y: usize) -> usize {
        let scroll_x = scroll_x.min(surface.width());
        let cols = (surface.width() - scroll_x).min(PANEL_WIDTH);
        let mut dest_y = 0;

        for y in scroll_y..surface.height() {
            if dest_y >= PANEL_HEIGHT {
                break;
            }
            let src = &surface.row(y)[scroll_x..scroll_x + cols];
            let start = dest_y * PANEL_WIDTH;
            let line = &mut self.panel[start..start + cols];
            for (out, &index) in line.iter_mut().zip(src) {
                *out = palette.get(index);
            }

            if y % ROW_DUPLICATE_PERIOD == 0 {
                if dest_y + 1 < PANEL_HEIGHT {
                    self.panel.copy_within(start..start + cols, start + PANEL_WIDTH);
                }
                dest_y += 1;
            }
            dest_y += 1;
        }
        dest_y.min(PANEL_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::memory::Allocator;
    use crate::video::palette::{DEFAULT_EGA_PALETTE, EGA_RGB, PALETTE_SIZE};
    use crate::video::surface::SurfaceUsage;

    fn striped(width: usize, height: usize) -> Surface {
        // row y holds palette index y % 16
        let mut surface = Allocator::new(336, 224, 1 << 20, 0).create(width, height, SurfaceUsage::Default);
        for y in 0..height {
            surface.fill_rect(0, y as i32, width as i32, 1, (y % 16) as u8);
        }
        surface
    }

    #[test]
    fn test_200_rows_scale_to_240() {
        let surface = striped(320, 200);
        let palette = Palette::default();
        let mut presenter = Presenter::default();
        assert_eq!(presenter.render(&surface, &palette, 0, 0), PANEL_HEIGHT);
    }

    #[test]
    fn test_every_fifth_row_doubled() {
        // distinct palette entries so rows can be told apart
        let mut palette = Palette::default();
        let mut adapter = [0u8; PALETTE_SIZE];
        for (i, slot) in adapter.iter_mut().enumerate() {
            *slot = (i * 4) as u8;
        }
        palette.refresh(&adapter);

        let surface = striped(320, 200);
        let mut presenter = Presenter::default();
        presenter.render(&surface, &palette, 0, 0);
        let panel_row = |d: usize| presenter.panel()[d * PANEL_WIDTH];

        let mut dest = 0;
        for y in 0..200 {
            let expected = palette.get((y % 16) as u8);
            assert_eq!(panel_row(dest), expected, "source row {y}");
            if y % 5 == 0 {
                assert_eq!(panel_row(dest + 1), expected, "duplicate of source row {y}");
                dest += 1;
            }
            dest += 1;
        }
        assert_eq!(dest, 240);

        // source row 5k lands on panel rows 6k and 6k+1
        assert_eq!(panel_row(6), palette.get(5));
        assert_eq!(panel_row(7), palette.get(5));
        assert_eq!(panel_row(12), palette.get(10));
        assert_eq!(panel_row(13), palette.get(10));
    }

    #[test]
    fn test_duplication_follows_absolute_row() {
        let surface = striped(320, 200);
        let palette = Palette::default();
        let mut presenter = Presenter::default();
        // scrolled by 3: source rows 3,4 single; row 5 doubled at panel rows 2,3
        presenter.render(&surface, &palette, 0, 3);
        let panel_row = |d: usize| presenter.panel()[d * PANEL_WIDTH];
        assert_eq!(panel_row(0), palette.get(3));
        assert_eq!(panel_row(1), palette.get(4));
        assert_eq!(panel_row(2), palette.get(5));
        assert_eq!(panel_row(3), palette.get(5));
        assert_eq!(panel_row(4), palette.get(6));
    }

    #[test]
    fn test_columns_clamped_and_scrolled() {
        let mut surface = striped(336, 224);
        surface.fill_rect(8, 0, 1, 224, 15);
        let palette = Palette::default();
        let mut presenter = Presenter::default();
        let rows = presenter.render(&surface, &palette, 8, 0);
        assert_eq!(rows, PANEL_HEIGHT);
        assert_eq!(presenter.panel()[0], palette.get(15));
        assert_eq!(presenter.panel()[1], palette.get(0));
    }

    #[test]
    fn test_short_surface_leaves_rest_untouched() {
        let surface = striped(16, 4);
        let palette = Palette::default();
        let mut presenter = Presenter::default();
        let rows = presenter.render(&surface, &palette, 0, 0);
        // row 0 doubled, rows 1..3 single
        assert_eq!(rows, 5);
        assert_eq!(presenter.panel()[16], Rgb565::BLACK);
        assert_eq!(presenter.panel()[5 * PANEL_WIDTH], Rgb565::BLACK);
    }

    #[test]
    fn test_palette_truncation_reaches_panel() {
        let mut palette = Palette::default();
        palette.refresh(&DEFAULT_EGA_PALETTE);
        let mut surface = striped(16, 16);
        surface.fill_rect(0, 0, 16, 1, 6);
        let mut presenter = Presenter::default();
        presenter.render(&surface, &palette, 0, 0);

        let [r, g, b] = EGA_RGB[20];
        let c = presenter.panel()[0].0;
        assert_eq!(c >> 11, (r >> 3) as u16);
        assert_eq!((c >> 5) & 0x3F, (g >> 2) as u16);
        assert_eq!(c & 0x1F, (b >> 3) as u16);
    }
}
