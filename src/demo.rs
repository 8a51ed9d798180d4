//! A small side-scrolling scene that drives the video layer the way a game
//! does: a tile map scrolled through a margin, a bouncing sprite, a status
//! line and a palette fade-in.

use log::info;

use crate::config::{FRONT_BUFFER_HEIGHT, FRONT_BUFFER_WIDTH};
use crate::error::VideoError;
use crate::transport::DisplaySink;
use crate::video::bitmap::{plane_stride, BitImage, PlanarImage};
use crate::video::palette::{DEFAULT_EGA_PALETTE, PALETTE_SIZE};
use crate::video::surface::{Surface, SurfaceUsage};
use crate::video::{Video, MODE_EGA_320X200};

const TILE: usize = 16;
const TILE_KINDS: usize = 4;
const VIEW_WIDTH: usize = 320;
const VIEW_HEIGHT: usize = 200;
const MAP_ROWS: usize = FRONT_BUFFER_HEIGHT / TILE;
const STATUS_HEIGHT: i32 = 10;
/// Colour of the line under the status strip.
const DIVIDER: u8 = 8;

const SKY: usize = 0;
const BRICK: usize = 1;
const GRASS: usize = 2;
const BRIGHT_BRICK: usize = 3;

/// 8x8 digits, one byte per row.
const DIGITS: [[u8; 8]; 10] = [
    [0x3C, 0x66, 0x6E, 0x76, 0x66, 0x66, 0x3C, 0x00],
    [0x18, 0x38, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00],
    [0x3C, 0x66, 0x06, 0x0C, 0x30, 0x60, 0x7E, 0x00],
    [0x3C, 0x66, 0x06, 0x1C, 0x06, 0x66, 0x3C, 0x00],
    [0x0C, 0x1C, 0x3C, 0x6C, 0x7E, 0x0C, 0x0C, 0x00],
    [0x7E, 0x60, 0x7C, 0x06, 0x06, 0x66, 0x3C, 0x00],
    [0x3C, 0x66, 0x60, 0x7C, 0x66, 0x66, 0x3C, 0x00],
    [0x7E, 0x66, 0x0C, 0x18, 0x18, 0x18, 0x18, 0x00],
    [0x3C, 0x66, 0x66, 0x3C, 0x66, 0x66, 0x3C, 0x00],
    [0x3C, 0x66, 0x66, 0x3E, 0x06, 0x66, 0x3C, 0x00],
];

/// Heart outline; the inside is left clear and painted by an inverse blit.
const HEART: [u8; 8] = [0x66, 0x99, 0x81, 0x81, 0x42, 0x24, 0x18, 0x00];

const CURSOR: [u8; 8] = [0x80, 0xC0, 0xE0, 0xF0, 0xF8, 0xE0, 0xB0, 0x18];

/// 16x4 drop shadow under the ball.
const SHADOW: [u8; 8] = [0x0F, 0xF0, 0x3F, 0xFC, 0x3F, 0xFC, 0x0F, 0xF0];

/// Pack palette indices into EGA planes. With `transparent` set, pixels of
/// that index become holes in a leading mask plane.
pub fn encode_planar(width: usize, height: usize, pixels: &[u8], transparent: Option<u8>) -> Vec<u8> {
    let stride = plane_stride(width);
    let plane_size = stride * height;
    let masked = transparent.is_some();
    let first = masked as usize;
    let mut out = vec![0u8; plane_size * (4 + first)];

    for y in 0..height {
        for x in 0..width {
            let index = pixels[y * width + x];
            let offset = y * stride + x / 8;
            let bit = 0x80 >> (x % 8);
            if Some(index) == transparent {
                out[offset] |= bit;
                continue;
            }
            for plane in 0..4 {
                if index & (1 << plane) != 0 {
                    out[(first + plane) * plane_size + offset] |= bit;
                }
            }
        }
    }
    out
}

fn tile_pixels(kind: usize) -> Vec<u8> {
    let mut px = vec![0u8; TILE * TILE];
    for y in 0..TILE {
        for x in 0..TILE {
            px[y * TILE + x] = match kind {
                SKY => 9,
                GRASS if y < 4 => 2,
                GRASS => 6,
                _ => {
                    // running bond: mortar every 8 rows, joints offset per course
                    let joint = if (y / 8) % 2 == 0 { 0 } else { 8 };
                    if y % 8 == 7 || x % 16 == joint { 7 } else { 4 }
                }
            };
        }
    }
    px
}

fn ball_pixels() -> Vec<u8> {
    let mut px = vec![0u8; TILE * TILE];
    for y in 0..TILE {
        for x in 0..TILE {
            let (dx, dy) = (x as i32 * 2 - 15, y as i32 * 2 - 15);
            let d = dx * dx + dy * dy;
            px[y * TILE + x] = if d > 225 {
                0
            } else if dx < -2 && dy < -2 && d < 80 {
                15
            } else {
                14
            };
        }
    }
    px
}

fn flower_pixels() -> Vec<u8> {
    let mut px = vec![0u8; 8 * 4];
    for (i, &c) in [13, 14, 13].iter().enumerate() {
        px[i + 2] = c;
    }
    px[8 + 3] = 13;
    px[16 + 3] = 2;
    px[24 + 3] = 2;
    px
}

/// Which tile sits at map column `col`, row `row`.
fn tile_at(col: usize, row: usize) -> usize {
    let ground = 9 + (col * 7 + col / 3) % 3;
    if row == ground {
        GRASS
    } else if row > ground {
        BRICK
    } else if row == 5 && col % 11 < 3 {
        BRIGHT_BRICK
    } else {
        SKY
    }
}

/// Palette for fade-in step `step`: black, then dim, then full colour.
fn fade_palette(step: u32) -> [u8; PALETTE_SIZE] {
    match step {
        0..=3 => [0; PALETTE_SIZE],
        4..=7 => DEFAULT_EGA_PALETTE.map(|c| c & 0b0011_1000),
        _ => DEFAULT_EGA_PALETTE,
    }
}

pub struct Demo {
    sheet: Surface,
    map: Surface,
    front: Surface,
    ball: Vec<u8>,
    next_column: usize,
    fine_x: usize,
    pos: (i32, i32),
    vel: (i32, i32),
    frame: u32,
}

impl Demo {
    /// Set the video mode, build the tile sheet and draw the first screen.
    pub fn new<S: DisplaySink>(video: &mut Video<S>) -> Result<Self, VideoError> {
        video.set_video_mode(MODE_EGA_320X200)?;
        video.refresh_palette(&fade_palette(0));

        // nothing can run without the tiles
        let mut sheet = video.create_surface(TILE * TILE_KINDS, TILE, SurfaceUsage::Default);
        for kind in [SKY, BRICK, GRASS] {
            let data = encode_planar(TILE, TILE, &tile_pixels(kind), None);
            let img = PlanarImage::unmasked(&data, TILE, TILE)?;
            sheet.unmasked_to_surface(&img, (kind * TILE) as i32, 0);
        }
        // bright brick: plain brick with the intensity plane forced on
        sheet.copy_within((BRIGHT_BRICK * TILE) as i32, 0, (BRICK * TILE) as i32, 0, TILE as i32, TILE as i32);
        let bright = encode_planar(TILE, TILE, &[8; TILE * TILE], None);
        let img = PlanarImage::unmasked(&bright, TILE, TILE)?;
        sheet.unmasked_to_surface_pm(&img, (BRIGHT_BRICK * TILE) as i32, 0, 0b1000);
        // decorate the grass
        let flower = encode_planar(8, 4, &flower_pixels(), Some(0));
        let img = PlanarImage::masked(&flower, 8, 4)?;
        sheet.masked_to_surface(&img, (GRASS * TILE + 4) as i32, 0);

        let mut map = video.try_create_surface(FRONT_BUFFER_WIDTH, FRONT_BUFFER_HEIGHT, SurfaceUsage::Default)?;
        let front = video.try_create_surface(FRONT_BUFFER_WIDTH, FRONT_BUFFER_HEIGHT, SurfaceUsage::FrontBuffer)?;
        let columns = FRONT_BUFFER_WIDTH / TILE;
        for col in 0..columns {
            draw_column(&mut map, &sheet, col, col);
        }
        info!(
            "demo ready: map in {:?}, front buffer in {:?}",
            map.tier(),
            front.tier()
        );

        Ok(Self {
            sheet,
            map,
            front,
            ball: encode_planar(TILE, TILE, &ball_pixels(), Some(0)),
            next_column: columns,
            fine_x: 0,
            pos: (40, 60),
            vel: (3, 2),
            frame: 0,
        })
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advance one frame and present it.
    pub fn step<S: DisplaySink>(&mut self, video: &mut Video<S>) -> Result<(), VideoError> {
        if self.frame < 12 {
            video.refresh_palette(&fade_palette(self.frame));
        }

        self.fine_x += 1;
        if self.fine_x == TILE {
            // shift the map a whole tile and draw the column that scrolled in
            self.map.scroll(TILE as i32, 0);
            draw_column(&mut self.map, &self.sheet, FRONT_BUFFER_WIDTH / TILE - 1, self.next_column);
            self.next_column += 1;
            self.fine_x = 0;
        }

        let (w, h) = self.map.dimensions();
        self.front.copy_from(&self.map, 0, 0, 0, 0, w as i32, h as i32);
        self.move_ball();
        self.draw_sprites()?;
        self.draw_status()?;

        video.present(&self.front, self.fine_x, 0);
        self.frame += 1;
        Ok(())
    }

    fn move_ball(&mut self) {
        let (mut x, mut y) = (self.pos.0 + self.vel.0, self.pos.1 + self.vel.1);
        if !(-8..=VIEW_WIDTH as i32 - 8).contains(&x) {
            self.vel.0 = -self.vel.0;
            x = x.clamp(-8, VIEW_WIDTH as i32 - 8);
        }
        if !(STATUS_HEIGHT..=VIEW_HEIGHT as i32 - TILE as i32).contains(&y) {
            self.vel.1 = -self.vel.1;
            y = y.clamp(STATUS_HEIGHT, VIEW_HEIGHT as i32 - TILE as i32);
        }
        self.pos = (x, y);
    }

    fn draw_sprites(&mut self) -> Result<(), VideoError> {
        let x = self.pos.0 + self.fine_x as i32;
        let shadow = BitImage::new(&SHADOW, TILE, 4)?;
        self.front.bit_blit_to_surface(&shadow, x.clamp(0, (FRONT_BUFFER_WIDTH - TILE) as i32), self.pos.1 + TILE as i32 - 2, 0);

        let ball = PlanarImage::masked(&self.ball, TILE, TILE)?;
        self.front.masked_blit_to_surface(&ball, x, self.pos.1);
        Ok(())
    }

    fn draw_status(&mut self) -> Result<(), VideoError> {
        let left = self.fine_x as i32;
        // darken the strip by dropping the intensity plane
        self.front.fill_rect_pm(left, 0, VIEW_WIDTH as i32, STATUS_HEIGHT, 0, 0b1000);
        self.front.fill_rect(left, STATUS_HEIGHT, VIEW_WIDTH as i32, 1, DIVIDER);

        let mut x = left + 4;
        for d in self.frame.to_string().bytes().map(|b| (b - b'0') as usize) {
            let img = BitImage::new(&DIGITS[d], 8, 8)?;
            self.front.bit_to_surface(&img, x, 1, 15);
            x += 8;
        }

        // map column counter, drawn into the red plane only
        let mut x = left + 120;
        for d in self.next_column.to_string().bytes().map(|b| (b - b'0') as usize) {
            let img = BitImage::new(&DIGITS[d], 8, 8)?;
            self.front.bit_to_surface_pm(&img, x, 1, 0b0100, 0b0100);
            x += 8;
        }

        // hearts hang off the right edge of the buffer
        let heart = BitImage::new(&HEART, 8, 8)?;
        for i in 0..3 {
            self.front.bit_inv_blit_to_surface(&heart, FRONT_BUFFER_WIDTH as i32 - 20 + i * 10, 1, 12);
        }

        // blinking cursor, xor'd so it shows on any background
        if self.frame % 16 < 8 {
            let cursor = BitImage::new(&CURSOR, 8, 8)?;
            let (cx, cy) = (left + 200, 1);
            let under = self.front.pixel(cx, cy).unwrap_or(0);
            let colour = if under & 0b1000 != 0 { 0b0111 } else { 0b1111 };
            self.front.bit_xor_with_surface(&cursor, cx, cy, colour);
        }
        Ok(())
    }

    /// Release every surface.
    pub fn finish<S: DisplaySink>(self, video: &mut Video<S>) {
        video.destroy_surface(self.front);
        video.destroy_surface(self.map);
        video.destroy_surface(self.sheet);
    }
}

/// Draw map column `col` into screen column `slot` of `map`.
fn draw_column(map: &mut Surface, sheet: &Surface, slot: usize, col: usize) {
    for row in 0..MAP_ROWS {
        let kind = tile_at(col, row);
        map.copy_from(
            sheet,
            (slot * TILE) as i32,
            (row * TILE) as i32,
            (kind * TILE) as i32,
            0,
            TILE as i32,
            TILE as i32,
        );
    }
}
