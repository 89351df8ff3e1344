//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Idle Sweep: Removes entries that outlived the idle timeout at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
