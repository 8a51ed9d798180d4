pub mod bitmap;
pub mod blit;
pub mod memory;
pub mod pacer;
pub mod palette;
pub mod present;
pub mod surface;

use log::{debug, info};

use crate::config::VideoConfig;
use crate::error::VideoError;
use crate::transport::DisplaySink;
use memory::{Allocator, MemoryTier, Pool};
use pacer::FramePacer;
use palette::{Palette, PALETTE_SIZE};
use present::Presenter;
use surface::{Surface, SurfaceUsage};

/// The EGA 320x200 16-colour mode, the only one this layer drives.
pub const MODE_EGA_320X200: u16 = 0x0D;

/// Video layer state. Owns everything a render loop touches: surface
/// storage, the palette, the panel buffer, frame pacing and the display.
pub struct Video<S: DisplaySink> {
    allocator: Allocator,
    palette: Palette,
    presenter: Presenter,
    pacer: FramePacer,
    sink: S,
    mode: Option<u16>,
    frame_count: u64,
}

impl<S: DisplaySink> Video<S> {
    pub fn new(config: &VideoConfig, sink: S) -> Self {
        Self {
            allocator: Allocator::new(
                config.front_width,
                config.front_height,
                config.internal_bytes,
                config.external_bytes,
            ),
            palette: Palette::default(),
            presenter: Presenter::default(),
            pacer: FramePacer::new(config.frame_rate),
            sink,
            mode: None,
            frame_count: 0,
        }
    }

    /// Program a video mode. Only [`MODE_EGA_320X200`] is supported.
    pub fn set_video_mode(&mut self, mode: u16) -> Result<(), VideoError> {
        if mode != MODE_EGA_320X200 {
            return Err(VideoError::UnsupportedMode(mode));
        }
        info!("video mode {:#04x}: 320x200 16 colours on 320x240 panel", mode);
        self.presenter.clear();
        self.sink.mode_set(mode);
        self.mode = Some(mode);
        Ok(())
    }

    pub fn mode(&self) -> Option<u16> {
        self.mode
    }

    pub fn try_create_surface(
        &mut self,
        width: usize,
        height: usize,
        usage: SurfaceUsage,
    ) -> Result<Surface, VideoError> {
        self.allocator.try_create(width, height, usage)
    }

    /// Allocate a surface. Running out of every memory tier halts the
    /// calling thread.
    pub fn create_surface(&mut self, width: usize, height: usize, usage: SurfaceUsage) -> Surface {
        self.allocator.create(width, height, usage)
    }

    pub fn destroy_surface(&mut self, surface: Surface) {
        debug!(
            "destroying {}x{} {:?} surface from {:?}",
            surface.width(),
            surface.height(),
            surface.usage(),
            surface.tier()
        );
        self.allocator.destroy(surface);
    }

    pub fn front_buffer_in_use(&self) -> bool {
        self.allocator.front_buffer_in_use()
    }

    pub fn pool(&self, tier: MemoryTier) -> Option<Pool> {
        self.allocator.pool(tier)
    }

    /// Rebuild the palette from the adapter's 16 EGA colour numbers.
    pub fn refresh_palette(&mut self, adapter: &[u8; PALETTE_SIZE]) {
        self.palette.refresh(adapter);
    }

    /// Scale `surface` onto the panel from `(scroll_x, scroll_y)` and push
    /// it to the display.
    pub fn present(&mut self, surface: &Surface, scroll_x: usize, scroll_y: usize) {
        self.presenter.render(surface, &self.palette, scroll_x, scroll_y);
        self.sink.push(self.presenter.panel());
        self.frame_count += 1;
    }

    /// Block for `vbls` logical frames and until the display is done with
    /// the previous frame.
    pub fn wait_vbls(&mut self, vbls: u32) {
        let sink = &mut self.sink;
        self.pacer.wait(vbls, || sink.in_flight());
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Single buffered: the visible buffer is always 0.
    pub fn active_buffer_id(&self) -> usize {
        0
    }

    pub fn num_buffers(&self) -> usize {
        1
    }

    pub fn panel(&self) -> &[palette::Rgb565] {
        self.presenter.panel()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
