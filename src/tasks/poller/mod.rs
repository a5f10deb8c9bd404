pub mod runner;
pub mod types;

pub use runner::Poller;
pub use types::PollerConfig;
