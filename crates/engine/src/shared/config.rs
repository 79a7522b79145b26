use std::time::Duration;

/// Timing knobs for one fill run. Reactive ATS pages re-render between
/// phases, so every dispatch is followed by a settle delay before the next
/// phase probes the resulting structure.
#[derive(Debug, Clone)]
pub struct FillTiming {
    /// Delay between phases.
    pub settle_delay: Duration,
    /// Gap between the synthetic events fired after a field write.
    pub event_stagger: Duration,
    /// Interval between spinner checks in the validation phase.
    pub validation_poll: Duration,
    /// Upper bound on spinner polling before correction runs anyway.
    pub validation_max_wait: Duration,
    /// How long a platform detection result stays cached.
    pub platform_cache_ttl: Duration,
    /// Page navigation timeout when opening a target.
    pub navigation: Duration,
}

impl Default for FillTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            event_stagger: Duration::from_millis(50),
            validation_poll: Duration::from_millis(500),
            validation_max_wait: Duration::from_millis(7000),
            platform_cache_ttl: Duration::from_secs(60),
            navigation: Duration::from_millis(30000),
        }
    }
}

impl FillTiming {
    pub fn fast() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            event_stagger: Duration::from_millis(25),
            validation_poll: Duration::from_millis(250),
            validation_max_wait: Duration::from_millis(3000),
            platform_cache_ttl: Duration::from_secs(30),
            navigation: Duration::from_millis(20000),
        }
    }

    pub fn patient() -> Self {
        Self {
            settle_delay: Duration::from_millis(2000),
            event_stagger: Duration::from_millis(100),
            validation_poll: Duration::from_millis(500),
            validation_max_wait: Duration::from_millis(15000),
            platform_cache_ttl: Duration::from_secs(120),
            navigation: Duration::from_millis(60000),
        }
    }

    pub fn with_settle_delay(mut self, ms: u64) -> Self {
        self.settle_delay = Duration::from_millis(ms);
        self
    }

    pub fn with_validation_max_wait(mut self, ms: u64) -> Self {
        self.validation_max_wait = Duration::from_millis(ms);
        self
    }
}
