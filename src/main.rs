mod config;
mod demo;
mod error;
mod screenshot;
mod transport;
mod video;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use eframe::egui;
use log::{error, info};

use crate::config::{Args, VideoConfig};
use crate::demo::Demo;
use crate::error::VideoError;
use crate::transport::LatestFrame;
use crate::video::memory::MemoryTier;
use crate::video::present::{PANEL_HEIGHT, PANEL_WIDTH};
use crate::video::Video;

/// Window pixels per panel pixel.
const ZOOM: f32 = 2.0;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = VideoConfig::from(&args);

    if args.headless {
        if let Err(err) = run_headless(&args, &config) {
            error!("{}", err);
            std::process::exit(1);
        }
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([PANEL_WIDTH as f32 * ZOOM + 20.0, PANEL_HEIGHT as f32 * ZOOM + 60.0])
            .with_title("VL-T4"),
        ..Default::default()
    };

    // RGBA panel written by the display thread, read by the window
    let framebuffer: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(vec![0u8; PANEL_WIDTH * PANEL_HEIGHT * 4]));
    let (sink, mut link) = transport::channel(framebuffer.clone());

    thread::spawn(move || link.run());

    let presented = Arc::new(AtomicU64::new(0));
    let presented_by_game = presented.clone();
    let refresh = Duration::from_secs(1) / config.frame_rate.max(1);

    // game loop: draw, present, wait
    thread::spawn(move || {
        let mut video = Video::new(&config, sink);
        let mut demo = match Demo::new(&mut video) {
            Ok(demo) => demo,
            Err(err) => {
                error!("demo setup failed: {}", err);
                return;
            }
        };
        loop {
            if let Err(err) = demo.step(&mut video) {
                error!("frame {} failed: {}", demo.frame(), err);
                break;
            }
            presented_by_game.store(video.frame_count(), Ordering::Relaxed);
            video.wait_vbls(1);
        }
        demo.finish(&mut video);
    });

    eframe::run_native(
        "vl-t4",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(PanelApp {
                framebuffer,
                presented,
                refresh,
                texture: None,
            }))
        }),
    )
}

/// Render `args.frames` frames without a window, optionally saving the last.
fn run_headless(args: &Args, config: &VideoConfig) -> Result<(), VideoError> {
    let mut video = Video::new(config, LatestFrame::default());
    let mut demo = Demo::new(&mut video)?;
    for _ in 0..args.frames {
        demo.step(&mut video)?;
        video.wait_vbls(1);
    }
    info!(
        "rendered {} frames ({} pushed) in mode {:?}, buffer {}/{}",
        video.frame_count(),
        video.sink().pushes,
        video.mode(),
        video.active_buffer_id(),
        video.num_buffers()
    );
    for tier in [MemoryTier::Internal, MemoryTier::External] {
        if let Some(pool) = video.pool(tier) {
            info!("{:?} RAM: {} of {} bytes in use", tier, pool.used, pool.capacity);
        }
    }
    info!("front buffer in use: {}", video.front_buffer_in_use());

    if let Some(path) = &args.screenshot {
        screenshot::save_png(path, video.panel(), PANEL_WIDTH as u32, PANEL_HEIGHT as u32)?;
    }
    demo.finish(&mut video);
    Ok(())
}

/// Window showing the panel, scaled up by [`ZOOM`].
struct PanelApp {
    framebuffer: Arc<Mutex<Vec<u8>>>,
    presented: Arc<AtomicU64>,
    refresh: Duration,
    texture: Option<egui::TextureHandle>,
}

impl PanelApp {
    /// Latest panel image, or black until the display thread has one.
    fn snapshot(&self) -> egui::ColorImage {
        let size = [PANEL_WIDTH, PANEL_HEIGHT];
        match self.framebuffer.lock() {
            Ok(fb) if fb.len() == PANEL_WIDTH * PANEL_HEIGHT * 4 => {
                egui::ColorImage::from_rgba_unmultiplied(size, &fb)
            }
            _ => egui::ColorImage::from_rgba_unmultiplied(size, &[0, 0, 0, 0xFF].repeat(PANEL_WIDTH * PANEL_HEIGHT)),
        }
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let image = self.snapshot();
        let texture = match self.texture.take() {
            Some(mut tex) => {
                tex.set(image, egui::TextureOptions::NEAREST);
                tex
            }
            None => ctx.load_texture("panel", image, egui::TextureOptions::NEAREST),
        };
        let size = egui::vec2(PANEL_WIDTH as f32 * ZOOM, PANEL_HEIGHT as f32 * ZOOM);
        let presented = self.presented.load(Ordering::Relaxed);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(format!("{}x{} panel at {}x, frame {}", PANEL_WIDTH, PANEL_HEIGHT, ZOOM, presented));
            ui.add(egui::Image::from_texture(&texture).fit_to_exact_size(size));
        });
        self.texture = Some(texture);

        ctx.request_repaint_after(self.refresh);
    }
}
