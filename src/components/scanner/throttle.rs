use std::time::Duration;
use tokio::time::Instant;

/// Sampling period of the scan loop
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Minimum spacing between accepted detections
pub const DETECTION_COOLDOWN: Duration = Duration::from_millis(2000);

/// Detection window state of one scan session.
///
/// Allows at most one recognition in flight and keeps accepted detections at
/// least `cooldown` apart.
#[derive(Debug, Clone)]
pub struct Throttle {
    cooldown: Duration,
    last_accepted_at: Option<Instant>,
    busy: bool,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DETECTION_COOLDOWN)
    }
}

impl Throttle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted_at: None,
            busy: false,
        }
    }

    /// Claim the slot for a recognition started at `now`
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if self.busy {
            return false;
        }
        if let Some(last) = self.last_accepted_at {
            if now.saturating_duration_since(last) < self.cooldown {
                return false;
            }
        }
        self.busy = true;
        true
    }

    /// Release the slot. An accepted detection restarts the cooldown at `now`.
    pub fn finish(&mut self, now: Instant, accepted: bool) {
        self.busy = false;
        if accepted {
            self.last_accepted_at = Some(now);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight() {
        let now = Instant::now();
        let mut throttle = Throttle::default();
        assert!(throttle.try_begin(now));
        assert!(throttle.is_busy());
        assert!(!throttle.try_begin(now + Duration::from_secs(10)));

        throttle.finish(now + Duration::from_millis(300), false);
        assert!(!throttle.is_busy());
        // An empty result does not start the cooldown
        assert!(throttle.try_begin(now + Duration::from_millis(500)));
    }

    #[test]
    fn test_cooldown_after_acceptance() {
        let now = Instant::now();
        let mut throttle = Throttle::default();
        assert!(throttle.try_begin(now));
        throttle.finish(now, true);

        assert!(!throttle.try_begin(now + Duration::from_millis(500)));
        assert!(!throttle.try_begin(now + Duration::from_millis(1999)));
        assert!(throttle.try_begin(now + DETECTION_COOLDOWN));
    }

    #[test]
    fn test_accepted_detections_stay_apart() {
        // Every tick recognizes something and completes after a varying delay
        let origin = Instant::now();
        let mut throttle = Throttle::default();
        let mut accepted = Vec::new();
        let mut in_flight: Option<Instant> = None;

        for tick in 0..200u64 {
            let now = origin + TICK_INTERVAL * tick as u32;
            if let Some(done_at) = in_flight {
                if done_at <= now {
                    throttle.finish(done_at, true);
                    accepted.push(done_at);
                    in_flight = None;
                }
            }
            if throttle.try_begin(now) {
                let latency = Duration::from_millis(100 + (tick * 137) % 900);
                in_flight = Some(now + latency);
            }
        }

        assert!(accepted.len() > 10);
        for pair in accepted.windows(2) {
            assert!(pair[1] - pair[0] >= DETECTION_COOLDOWN);
        }
    }
}
