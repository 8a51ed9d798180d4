use std::fs;
use std::io::BufWriter;
use std::path::Path;

use log::info;

use crate::error::VideoError;
use crate::transport::to_rgba_bytes;
use crate::video::palette::Rgb565;

/// Encode a panel image as an RGBA PNG file.
pub fn save_png(path: &Path, frame: &[Rgb565], width: u32, height: u32) -> Result<(), VideoError> {
    let expected = width as usize * height as usize;
    if frame.len() != expected {
        return Err(VideoError::ImageSize { expected, actual: frame.len() });
    }

    let file = fs::File::create(path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&to_rgba_bytes(frame))?;
    info!("wrote {}x{} screenshot to {}", width, height, path.display());
    Ok(())
}
