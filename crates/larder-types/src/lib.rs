//! Shared types for the Larder cache and session stores.

pub mod clock;
pub mod config;
pub mod id;
pub mod stats;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    CacheConfigProvider, ConfigProvider, HasCacheConfig, HasSessionConfig,
    SessionConfigProvider, defaults as config_defaults,
};
pub use id::UserId;
pub use stats::hit_rate;
pub use sweeper::{SweeperHandle, spawn_sweeper};
