use std::path::PathBuf;

use clap::Parser;

use crate::video::pacer::DEFAULT_FRAME_RATE;

/// Front buffer dimensions: a 320x200 view plus a 16 pixel scroll margin
/// on the right and 24 rows below.
pub const FRONT_BUFFER_WIDTH: usize = 336;
pub const FRONT_BUFFER_HEIGHT: usize = 224;

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "vl-t4", about = "16-colour surface engine driving a 320x240 RGB565 panel")]
pub struct Args {
    /// Render without opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Number of frames to render before exiting (headless only).
    #[arg(long, default_value_t = 70)]
    pub frames: u32,

    /// Write the last presented frame to this PNG file.
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Logical frame rate used by the frame pacer.
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    pub fps: u32,

    /// Internal RAM budget for surfaces, in KiB.
    #[arg(long, default_value_t = 256)]
    pub internal_kib: usize,

    /// External RAM budget for surfaces, in KiB.
    #[arg(long, default_value_t = 8192)]
    pub external_kib: usize,
}

/// Settings for a [`Video`](crate::video::Video) context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConfig {
    pub front_width: usize,
    pub front_height: usize,
    pub internal_bytes: usize,
    pub external_bytes: usize,
    pub frame_rate: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            front_width: FRONT_BUFFER_WIDTH,
            front_height: FRONT_BUFFER_HEIGHT,
            internal_bytes: 256 * 1024,
            external_bytes: 8 * 1024 * 1024,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl From<&Args> for VideoConfig {
    fn from(args: &Args) -> Self {
        Self {
            internal_bytes: args.internal_kib * 1024,
            external_bytes: args.external_kib * 1024,
            frame_rate: args.fps,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults_match_config() {
        let args = Args::parse_from(["vl-t4"]);
        assert!(!args.headless);
        assert_eq!(VideoConfig::from(&args), VideoConfig::default());
    }

    #[test]
    fn test_args_override() {
        let args = Args::parse_from([
            "vl-t4", "--headless", "--frames", "3", "--fps", "70",
            "--internal-kib", "64", "--screenshot", "out.png",
        ]);
        assert!(args.headless);
        assert_eq!(args.frames, 3);
        assert_eq!(args.screenshot, Some(PathBuf::from("out.png")));
        let config = VideoConfig::from(&args);
        assert_eq!(config.frame_rate, 70);
        assert_eq!(config.internal_bytes, 64 * 1024);
        assert_eq!(config.front_width, 336);
    }
}
