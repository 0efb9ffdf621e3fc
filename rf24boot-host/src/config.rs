use std::time::Duration;

use crate::util::Pass;

/// Round trip timeouts, one per pass. A single timeout aborts the pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Timeouts {
    pub hello: Duration,
    pub write: Duration,
    pub read: Duration,
    pub verify: Duration,
    pub boot: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            hello: Duration::from_millis(1000),
            write: Duration::from_millis(15000),
            read: Duration::from_millis(5000),
            verify: Duration::from_millis(2000),
            boot: Duration::from_millis(1000),
        }
    }
}

impl Timeouts {
    pub fn for_pass(&self, pass: Pass) -> Duration {
        match pass {
            Pass::Hello => self.hello,
            Pass::Write => self.write,
            Pass::Read => self.read,
            Pass::Verify => self.verify,
            Pass::Boot => self.boot,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SessionConfig {
    /// Most commands batched into one round trip.
    pub window: usize,
    pub timeouts: Timeouts,
    /// Quiet time after which a partially filled read is handed back.
    pub idle_gap: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window: 16,
            timeouts: Timeouts::default(),
            idle_gap: Duration::from_millis(100),
        }
    }
}
