//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a client is alive.
//!
//! # Tasks
//! - Eviction Sweeper: Removes expired memory cache entries at a fixed interval

mod sweeper;

pub use sweeper::{spawn_eviction_sweeper, ExpirySweep};
