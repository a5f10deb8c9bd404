use std::time::Duration;

/// Scheduler parameters, resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wall-clock interval between poll cycles.
    pub period: Duration,
    /// Per-feed fan-out delay multiplier within one cycle.
    pub stagger: Duration,
    /// Feed URLs to poll, in fetch-initiation order.
    pub feeds: Vec<String>,
    /// Destination channels every polled feed announces to.
    pub channels: Vec<String>,
}
