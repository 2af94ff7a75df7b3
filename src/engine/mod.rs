// src/engine/mod.rs

//! Polling engine.
//!
//! - [`cycle`] runs one poll → execute → report cycle and recovers from
//!   every failure at its boundary.
//! - [`scheduler`] fires cycles with fixed-delay semantics, one at a time.
//! - [`status`] publishes the host-visible [`crate::types::AgentStatus`].

pub mod cycle;
pub mod scheduler;
pub mod status;

pub use cycle::{CycleReport, CycleRunner};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use status::StatusChannel;
