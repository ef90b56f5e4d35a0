//! Frame Interval Timer
//!
//! Counts emulated frames and fires every `period` frames, the first time on
//! frame `period`.

/// Periodic frame trigger
#[derive(Debug, Clone)]
pub struct FrameInterval {
    /// Frames between two firings
    period: u32,
    /// Frames until next firing
    frames_until_fire: u32,
    /// Total firings
    fire_count: u64,
}

impl FrameInterval {
    /// Create a timer firing every `period` frames (a zero period fires every frame)
    pub fn new(period: u32) -> Self {
        let period = period.max(1);
        FrameInterval {
            period,
            frames_until_fire: period,
            fire_count: 0,
        }
    }

    /// Clock the timer by one frame
    /// Returns true if the interval elapsed on this frame
    pub fn clock(&mut self) -> bool {
        self.frames_until_fire = self.frames_until_fire.saturating_sub(1);

        if self.frames_until_fire == 0 {
            self.fire_count += 1;
            self.frames_until_fire = self.period;
            true
        } else {
            false
        }
    }

    /// Total firings
    pub fn fire_count(&self) -> u64 {
        self.fire_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_period() {
        let mut interval = FrameInterval::new(10);
        let fired: Vec<u64> = (1..=30)
            .filter(|_| interval.clock())
            .collect();
        assert_eq!(fired, vec![10, 20, 30]);
        assert_eq!(interval.fire_count(), 3);
    }

    #[test]
    fn test_zero_period_fires_every_frame() {
        let mut interval = FrameInterval::new(0);
        assert!(interval.clock());
        assert!(interval.clock());
        assert_eq!(interval.fire_count(), 2);
    }
}
