use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Longest frame delta applied in one `advance`. Longer frames, such as
    /// after a hitch or a debugger pause, are clamped to this.
    pub max_frame_delta: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: Duration::from_millis(250),
        }
    }
}
