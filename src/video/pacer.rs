use std::thread;
use std::time::{Duration, Instant};

/// Logical frame rate of the game, independent of the panel refresh.
pub const DEFAULT_FRAME_RATE: u32 = 35;

/// Longest single sleep while waiting, so the thread keeps yielding.
const SLICE: Duration = Duration::from_millis(1);

/// Throttles the render loop to whole logical frames.
#[derive(Debug)]
pub struct FramePacer {
    frame: Duration,
    last_release: Option<Instant>,
}

impl FramePacer {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame: Duration::from_secs(1) / frame_rate.max(1),
            last_release: None,
        }
    }

    /// Block until `vbls` frames have passed since the previous release and
    /// `busy` reports the display idle. The first call only waits on `busy`.
    ///
    /// Returns the time spent waiting.
    pub fn wait(&mut self, vbls: u32, mut busy: impl FnMut() -> bool) -> Duration {
        let entered = Instant::now();
        let deadline = self.last_release.map(|t| t + self.frame * vbls);

        loop {
            let now = Instant::now();
            let early = deadline.map_or(false, |d| now < d);
            if !early && !busy() {
                break;
            }
            match deadline {
                Some(d) if now < d => thread::sleep((d - now).min(SLICE)),
                _ => thread::yield_now(),
            }
        }

        let released = Instant::now();
        self.last_release = Some(released);
        released - entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_wait_returns_immediately() {
        let mut pacer = FramePacer::new(35);
        let waited = pacer.wait(10, || false);
        assert!(waited < Duration::from_millis(100));
    }

    #[test]
    fn test_wait_spans_requested_frames() {
        let mut pacer = FramePacer::new(200); // 5ms frames
        pacer.wait(1, || false);
        let start = Instant::now();
        pacer.wait(3, || false);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_reference_resets_on_release() {
        let mut pacer = FramePacer::new(100); // 10ms frames
        pacer.wait(1, || false);
        thread::sleep(Duration::from_millis(25));
        // the interval already passed while we were busy elsewhere
        let waited = pacer.wait(1, || false);
        assert!(waited < Duration::from_millis(10));
    }

    #[test]
    fn test_waits_for_display() {
        let mut pacer = FramePacer::new(1000);
        let mut polls = 0;
        pacer.wait(1, || {
            polls += 1;
            polls < 5
        });
        assert_eq!(polls, 5);
    }

    #[test]
    fn test_frame_duration() {
        assert_eq!(FramePacer::new(35).frame, Duration::from_secs(1) / 35);
        assert_eq!(FramePacer::new(0).frame, Duration::from_secs(1));
    }
}
