use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Length of one fixed simulation step
    pub tick_interval: Duration,
    /// Added to a finished performance's after-life before it is deleted, so
    /// trailing effects are never cut short
    pub deletion_margin: Duration,
    /// Time between creating a performance and running its finish-startup
    /// step. Callers attach constraints in between.
    pub finish_startup_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(32),
            deletion_margin: Duration::from_millis(500),
            finish_startup_delay: Duration::ZERO,
        }
    }
}

impl ServerConfig {
    pub(crate) fn tick_interval_ms(&self) -> u64 {
        duration_ms(self.tick_interval)
    }

    pub(crate) fn deletion_margin_ms(&self) -> u64 {
        duration_ms(self.deletion_margin)
    }

    pub(crate) fn finish_startup_delay_ms(&self) -> u64 {
        duration_ms(self.finish_startup_delay)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
