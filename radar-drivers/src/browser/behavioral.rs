use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Default)]
/// Produces human‑like pauses so navigations do not fire back to back.
pub struct BehavioralEngine {
    /// Zero disables pauses (tests, warm caches).
    pub scale: u32,
}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self { scale: 1 }
    }

    pub fn instant() -> Self {
        Self { scale: 0 }
    }

    /// Pick a pause between `min` and `max` milliseconds.
    pub fn pick_delay(&self, min: u64, max: u64) -> Duration {
        if self.scale == 0 || max == 0 {
            return Duration::ZERO;
        }
        let ms = OsRng.gen_range(min..=max.max(min));
        Duration::from_millis(ms * u64::from(self.scale))
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        let d = self.pick_delay(min, max);
        if !d.is_zero() {
            sleep(d).await;
        }
    }
}
