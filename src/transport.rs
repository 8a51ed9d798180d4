use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::debug;

use crate::video::palette::Rgb565;

/// Events sent from the video layer to the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Frame(Vec<Rgb565>),
    /// The video mode was (re)programmed; the display should blank.
    ModeSet(u16),
}

/// Backchannel messages from the display to the video layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backchannel {
    /// One frame has been scanned out and its buffer may be reused.
    FrameDone,
}

/// Where presented frames go.
pub trait DisplaySink {
    /// Hand over a complete panel image.
    fn push(&mut self, frame: &[Rgb565]);

    /// Whether a previously pushed frame is still being transferred.
    fn in_flight(&mut self) -> bool {
        false
    }

    fn mode_set(&mut self, _mode: u16) {}
}

/// Keeps the most recent frame. Used headless and by tests.
#[derive(Debug, Default)]
pub struct LatestFrame {
    pub frame: Vec<Rgb565>,
    pub pushes: usize,
}

impl DisplaySink for LatestFrame {
    fn push(&mut self, frame: &[Rgb565]) {
        self.frame.clear();
        self.frame.extend_from_slice(frame);
        self.pushes += 1;
    }
}

/// Sends frames to a display thread and tracks their completion.
pub struct ChannelSink {
    tx: Sender<DisplayEvent>,
    backchannel_rx: Receiver<Backchannel>,
    pending: usize,
}

impl ChannelSink {
    pub fn new(tx: Sender<DisplayEvent>, backchannel_rx: Receiver<Backchannel>) -> Self {
        Self { tx, backchannel_rx, pending: 0 }
    }

    /// Drain acknowledgements without blocking.
    fn poll_backchannel(&mut self) {
        loop {
            match self.backchannel_rx.try_recv() {
                Ok(Backchannel::FrameDone) => self.pending = self.pending.saturating_sub(1),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // nobody left to acknowledge
                    self.pending = 0;
                    break;
                }
            }
        }
    }
}

impl DisplaySink for ChannelSink {
    fn push(&mut self, frame: &[Rgb565]) {
        if self.tx.send(DisplayEvent::Frame(frame.to_vec())).is_ok() {
            self.pending += 1;
        } else {
            debug!("display disconnected, dropping frame");
        }
    }

    fn in_flight(&mut self) -> bool {
        self.poll_backchannel();
        self.pending > 0
    }

    fn mode_set(&mut self, mode: u16) {
        let _ = self.tx.send(DisplayEvent::ModeSet(mode));
    }
}

/// Convert a panel image to RGBA8 bytes.
pub fn to_rgba_bytes(frame: &[Rgb565]) -> Vec<u8> {
    let pixels: Vec<[u8; 4]> = frame.iter().map(|c| c.to_rgba()).collect();
    bytemuck::cast_slice::<[u8; 4], u8>(&pixels).to_vec()
}

/// Receiving end of a [`ChannelSink`]: turns frames into the RGBA buffer
/// shared with the window.
pub struct DisplayLink {
    rx: Receiver<DisplayEvent>,
    backchannel_tx: Sender<Backchannel>,
    framebuffer: Arc<Mutex<Vec<u8>>>,
    pub frames: u64,
}

impl DisplayLink {
    pub fn new(
        rx: Receiver<DisplayEvent>,
        backchannel_tx: Sender<Backchannel>,
        framebuffer: Arc<Mutex<Vec<u8>>>,
    ) -> Self {
        Self { rx, backchannel_tx, framebuffer, frames: 0 }
    }

    /// Run the display loop until the sender goes away. Call from a
    /// dedicated thread.
    pub fn run(&mut self) {
        while let Ok(event) = self.rx.recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::Frame(frame) => {
                let rgba = to_rgba_bytes(&frame);
                if let Ok(mut fb) = self.framebuffer.lock() {
                    *fb = rgba;
                }
                self.frames += 1;
                let _ = self.backchannel_tx.send(Backchannel::FrameDone);
            }
            DisplayEvent::ModeSet(mode) => {
                debug!("display mode set to {:#04x}", mode);
                if let Ok(mut fb) = self.framebuffer.lock() {
                    fb.fill(0);
                }
            }
        }
    }
}

/// Create a connected sink and display link writing into `framebuffer`.
pub fn channel(framebuffer: Arc<Mutex<Vec<u8>>>) -> (ChannelSink, DisplayLink) {
    // one frame queued while another is being shown
    let (tx, rx) = crossbeam_channel::bounded(1);
    let (back_tx, back_rx) = crossbeam_channel::unbounded();
    (ChannelSink::new(tx, back_rx), DisplayLink::new(rx, back_tx, framebuffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_frame_keeps_last() {
        let mut sink = LatestFrame::default();
        sink.push(&[Rgb565(1), Rgb565(2)]);
        sink.push(&[Rgb565(3)]);
        assert_eq!(sink.frame, vec![Rgb565(3)]);
        assert_eq!(sink.pushes, 2);
        assert!(!sink.in_flight());
    }

    #[test]
    fn test_to_rgba_bytes() {
        let bytes = to_rgba_bytes(&[Rgb565(0xF800), Rgb565(0x001F)]);
        assert_eq!(bytes, vec![0xFF, 0, 0, 0xFF, 0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn test_channel_in_flight_until_acknowledged() {
        let fb = Arc::new(Mutex::new(vec![0u8; 8]));
        let (mut sink, mut link) = channel(fb.clone());
        sink.push(&[Rgb565(0xFFFF), Rgb565(0)]);
        assert!(sink.in_flight());

        let event = link.rx.recv().unwrap();
        link.handle_event(event);
        assert!(!sink.in_flight());
        assert_eq!(link.frames, 1);
        assert_eq!(*fb.lock().unwrap(), vec![0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_mode_set_blanks_framebuffer() {
        let fb = Arc::new(Mutex::new(vec![0xAAu8; 8]));
        let (mut sink, mut link) = channel(fb.clone());
        sink.mode_set(0x0D);
        let event = link.rx.recv().unwrap();
        assert_eq!(event, DisplayEvent::ModeSet(0x0D));
        link.handle_event(event);
        assert!(fb.lock().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_disconnected_display_is_never_busy() {
        let fb = Arc::new(Mutex::new(Vec::new()));
        let (mut sink, link) = channel(fb);
        sink.push(&[Rgb565(0)]);
        drop(link);
        assert!(!sink.in_flight());
    }

    #[test]
    fn test_display_thread_runs_until_sender_dropped() {
        let fb = Arc::new(Mutex::new(Vec::new()));
        let (mut sink, mut link) = channel(fb.clone());
        let handle = std::thread::spawn(move || {
            link.run();
            link.frames
        });
        sink.push(&[Rgb565(0x07E0)]);
        sink.push(&[Rgb565(0x07E0)]);
        drop(sink);
        assert_eq!(handle.join().unwrap(), 2);
        assert_eq!(*fb.lock().unwrap(), vec![0, 0xFF, 0, 0xFF]);
    }
}
